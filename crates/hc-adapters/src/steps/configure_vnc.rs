//! Pide la sesión de consola VNC, espera a que esté lista y levanta el
//! proxy TCP local hacia su websocket en un puerto libre de
//! `[vnc_port_min, vnc_port_max)`.

use std::net::{Ipv4Addr, SocketAddr};

use hc_core::{Step, StepAction};
use hc_domain::ConsoleSession;
use hc_vnc::WsProxy;
use log::info;

use super::finish;
use crate::error::BuildError;
use crate::net::bind_random_port;
use crate::state::{BuildState, StateKey};

pub const CONSOLE_TYPE_VNC: &str = "vnc";

/// URL websocket de la sesión: la que trae la API o `ws://host:port/`.
pub fn websocket_url(session: &ConsoleSession) -> Result<String, BuildError> {
    if let Some(url) = session.url.as_deref().filter(|u| !u.is_empty()) {
        return Ok(url.to_string());
    }
    match (session.host.as_deref(), session.port) {
        (Some(host), Some(port)) => Ok(format!("ws://{host}:{port}/")),
        _ => Err(BuildError::precondition(format!("console session {} has neither url nor host/port", session.id))),
    }
}

#[derive(Default)]
pub struct StepConfigureVnc {
    proxy: Option<WsProxy>,
}

impl StepConfigureVnc {
    pub fn new() -> Self {
        Self::default()
    }

    fn execute(&mut self, state: &mut BuildState) -> Result<(), BuildError> {
        let instance_id = state.instance_ref()?.id.clone();

        state.ui.say("Requesting VNC console session");
        let session = state.client.console_request(&instance_id, CONSOLE_TYPE_VNC, state.config.wait_timeout())?;
        let ws_url = websocket_url(&session)?;

        let (min, max) = (state.config.vnc_port_min, state.config.vnc_port_max);
        state.ui.say(&format!("Looking for available port between {min} and {max}"));
        let (_, proxy) = bind_random_port(min, max, |port| {
            WsProxy::start(SocketAddr::from((Ipv4Addr::LOCALHOST, port)), &ws_url)
        })?;
        state.ui.say(&format!("VNC proxy listening on {}", proxy.local_addr()));
        state.ui.say(&format!("Upstream websocket: {ws_url}"));

        state.vnc_proxy = Some(proxy.local_addr());
        state.console = Some(session);
        self.proxy = Some(proxy);
        Ok(())
    }
}

impl Step<BuildState> for StepConfigureVnc {
    fn id(&self) -> &str {
        "configure_vnc"
    }

    fn requires(&self) -> Vec<StateKey> {
        vec![StateKey::Instance]
    }

    fn run(&mut self, state: &mut BuildState) -> StepAction {
        let result = self.execute(state);
        finish(state, result)
    }

    fn cleanup(&mut self, state: &mut BuildState) {
        if let Some(mut proxy) = self.proxy.take() {
            info!("stopping vnc proxy on {}", proxy.local_addr());
            proxy.shutdown();
        }
        state.vnc_proxy = None;
        state.console = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hc_domain::ConsoleState;

    fn session(url: Option<&str>, host: Option<&str>, port: Option<u16>) -> ConsoleSession {
        ConsoleSession { id: "c-1".into(),
                         session_type: "vnc".into(),
                         token: "t".into(),
                         host: host.map(str::to_string),
                         port,
                         url: url.map(str::to_string),
                         state: ConsoleState::Ready }
    }

    #[test]
    fn explicit_url_wins() {
        let s = session(Some("wss://console/abc"), Some("h"), Some(1));
        assert_eq!(websocket_url(&s).expect("url"), "wss://console/abc");
    }

    #[test]
    fn host_and_port_build_a_ws_url() {
        assert_eq!(websocket_url(&session(None, Some("10.0.0.2"), Some(5901))).expect("url"),
                   "ws://10.0.0.2:5901/");
        assert!(websocket_url(&session(None, None, None)).is_err());
    }
}
