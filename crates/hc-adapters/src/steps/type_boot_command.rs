//! Tipea el boot command en la consola de la instancia.
//!
//! Conecta al proxy local, hace el handshake RFB autenticando con el token
//! de la sesión y tipea cada línea ya interpolada. La cancelación se mira
//! entre líneas: una línea en curso no se interrumpe.

use std::net::TcpStream;
use std::time::Duration;

use hc_core::{Step, StepAction, StepState};
use hc_vnc::{type_string, RfbClient};
use log::info;

use super::finish;
use crate::error::BuildError;
use crate::state::{BuildState, StateKey};
use crate::template::render;

/// Sin respuesta del servidor en este lapso el handshake falla.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(30);

pub struct StepTypeBootCommand;

impl StepTypeBootCommand {
    /// `Ok(false)` si se canceló entre líneas.
    fn execute(&self, state: &mut BuildState) -> Result<bool, BuildError> {
        let addr = state.vnc_proxy_addr()?;
        let token = state.console_ref()?.token.clone();

        state.ui.say("Connecting to VM via VNC");
        let stream = TcpStream::connect(addr)?;
        stream.set_read_timeout(Some(HANDSHAKE_TIMEOUT))?;
        stream.set_nodelay(true)?;
        let mut client = RfbClient::connect(stream, &token, true)?;
        info!("connected to VNC desktop {:?} ({:?})", client.desktop_name(), client.version());

        state.ui.say("Typing the boot command over VNC...");
        let delay = state.config.key_interval();
        for line in &state.config.boot_command {
            let command = render(line, &state.template_vars)?;
            if state.cancel.is_cancelled() {
                return Ok(false);
            }
            type_string(&mut client, &command, delay)?;
        }
        Ok(true)
    }
}

impl Step<BuildState> for StepTypeBootCommand {
    fn id(&self) -> &str {
        "type_boot_command"
    }

    fn requires(&self) -> Vec<StateKey> {
        vec![StateKey::VncProxy, StateKey::ConsoleSession]
    }

    fn run(&mut self, state: &mut BuildState) -> StepAction {
        match self.execute(state) {
            Ok(true) => StepAction::Continue,
            Ok(false) => {
                state.ui.error("Boot command interrupted by cancellation");
                state.signals_mut().mark_cancelled();
                StepAction::Halt
            }
            Err(e) => finish(state, Err(e)),
        }
    }
}
