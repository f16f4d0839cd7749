//! hc-vnc: control remoto de la consola de una instancia cuando todavía no
//! hay SSH.
//!
//! - `auth`: desafío/respuesta VNC (DES con clave bit-invertida).
//! - `keys`: tokenizador del boot command y emisión de eventos de teclado.
//! - `rfb`: cliente RFB mínimo (handshake + KeyEvent).
//! - `proxy`: listener TCP local que puentea a la consola websocket.

pub mod auth;
pub mod error;
pub mod keys;
pub mod proxy;
pub mod rfb;

pub use auth::{encrypt_challenge, AuthStage, VncAuth};
pub use error::VncError;
pub use keys::{tokenize, type_string, KeyboardSink, Token, KEY_DELAY, KEY_LEFT_SHIFT};
pub use proxy::WsProxy;
pub use rfb::{ProtocolVersion, RfbClient};
