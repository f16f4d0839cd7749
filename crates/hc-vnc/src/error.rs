use std::io;

use thiserror::Error;

use crate::auth::AuthStage;

#[derive(Debug, Error)]
pub enum VncError {
    #[error("i/o error talking to the console: {0}")]
    Io(#[from] io::Error),
    #[error("vnc authentication failed while {stage}: {source}")]
    Auth { stage: AuthStage, source: io::Error },
    #[error("server speaks an unsupported protocol: {0:?}")]
    UnsupportedVersion(String),
    #[error("server offers no supported security type (offered {0:?})")]
    NoSupportedSecurity(Vec<u8>),
    #[error("server refused the connection: {0}")]
    Refused(String),
    #[error("authentication rejected by server: {0}")]
    AuthRejected(String),
    #[error("malformed server message: {0}")]
    Protocol(String),
    #[error("console proxy error: {0}")]
    Proxy(String),
}
