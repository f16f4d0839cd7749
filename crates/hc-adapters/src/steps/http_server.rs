//! Levanta el servidor HTTP de `http_directory` y publica `HTTPIP` /
//! `HTTPPort` para el boot command. Sin directorio no levanta nada y el
//! puerto queda en 0.

use std::net::{Ipv4Addr, SocketAddr};

use hc_core::{Step, StepAction};
use log::info;

use super::finish;
use crate::error::BuildError;
use crate::http_server::HttpServer;
use crate::net::{bind_random_port, guess_local_ip};
use crate::state::BuildState;

#[derive(Default)]
pub struct StepHttpServer {
    server: Option<HttpServer>,
}

impl StepHttpServer {
    pub fn new() -> Self {
        Self::default()
    }

    fn execute(&mut self, state: &mut BuildState) -> Result<(), BuildError> {
        let Some(dir) = state.config.http_directory.clone() else {
            state.ui.say("Not starting HTTP server, http_directory not set");
            state.http_port = Some(0);
            state.set_var("HTTPPort", "0");
            let http_ip = state.config.http_ip.clone().unwrap_or_default();
            state.set_var("HTTPIP", http_ip);
            return Ok(());
        };

        let (min, max) = (state.config.http_port_min, state.config.http_port_max);
        state.ui.say(&format!("Looking for available port between {min} and {max}"));
        let (_, server) = bind_random_port(min, max, |port| {
            HttpServer::start(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)), dir.clone())
        })?;
        let port = server.local_addr().port();
        state.ui.say(&format!("Starting HTTP server on port {port}"));
        self.server = Some(server);

        let http_ip = match state.config.http_ip.clone().filter(|ip| !ip.is_empty()) {
            Some(ip) => ip,
            None => match guess_local_ip() {
                Ok(ip) => {
                    state.ui.say(&format!("http_ip not supplied, guessing the local ip: {ip}"));
                    ip.to_string()
                }
                Err(e) => {
                    state.ui.error(&format!("http_ip not supplied, failed to guess the local ip: {e}"));
                    String::new()
                }
            },
        };
        state.http_port = Some(port);
        state.set_var("HTTPPort", port.to_string());
        state.set_var("HTTPIP", http_ip);
        Ok(())
    }
}

impl Step<BuildState> for StepHttpServer {
    fn id(&self) -> &str {
        "http_server"
    }

    fn run(&mut self, state: &mut BuildState) -> StepAction {
        let result = self.execute(state);
        finish(state, result)
    }

    fn cleanup(&mut self, _state: &mut BuildState) {
        if let Some(mut server) = self.server.take() {
            info!("stopping http server on {}", server.local_addr());
            server.shutdown();
        }
    }
}
