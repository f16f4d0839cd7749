//! hc-adapters: los builders de HyperCloud sobre el motor de `hc-core`.
//!
//! Este crate provee:
//! - `BuildState`: estado tipado por corrida (un `Option` por recurso) y
//!   `StateKey` para los prerequisitos de cada step.
//! - `steps`: los steps concretos (región, discos, IP, instancia, clave,
//!   boot, consola VNC, tipeo, conexión, aprovisionamiento, apagado,
//!   teardown).
//! - `pipeline`: composición de los pipelines clone y vnc.
//! - `Builder`: valida la configuración, corre el pipeline y entrega el
//!   `Artifact` (el disco producido).
//! - Fronteras con el host: `Ui`, `Communicator`/`CommunicatorFactory`,
//!   `Provisioner`.

pub mod artifact;
pub mod builder;
pub mod communicator;
pub mod config;
pub mod error;
pub mod http_server;
pub mod net;
pub mod pipeline;
pub mod state;
pub mod steps;
pub mod template;
pub mod ui;

pub use artifact::Artifact;
pub use builder::{BuildHost, Builder};
pub use communicator::{CmdOutput, Communicator, CommunicatorFactory, NoopProvisioner, Provisioner, RemoteCmd,
                       RemoteProcess, ShellProvisioner, SshTarget};
pub use config::{BuildConfig, BuilderKind};
pub use error::{BuildError, ConfigError};
pub use state::{ApiTransport, BuildState, Client, StateKey};
pub use ui::{LogUi, MemoryUi, Ui, UiLevel};
