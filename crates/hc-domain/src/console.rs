use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsoleState {
    Requested,
    Ready,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for ConsoleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
                        ConsoleState::Requested => "requested",
                        ConsoleState::Ready => "ready",
                        ConsoleState::Unknown => "unknown",
                    })
    }
}

/// Sesión de consola remota; efímera, sólo vive durante la corrida.
///
/// Las de tipo `vnc` exponen `url` (websocket); el resto `host`/`port`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleSession {
    pub id: String,
    #[serde(rename = "type", default)]
    pub session_type: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub url: Option<String>,
    pub state: ConsoleState,
}

impl ConsoleSession {
    pub fn is_ready(&self) -> bool {
        self.state == ConsoleState::Ready
    }

    pub fn is_vnc(&self) -> bool {
        self.session_type == "vnc"
    }
}
