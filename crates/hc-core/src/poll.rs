//! Primitiva poll-until-state.
//!
//! La API remota no tiene canal push: toda operación asíncrona (attach/detach
//! en vivo, boot, stop, terminate, sesión de consola) se convierte en una
//! llamada síncrona consultando el estado a cadencia fija hasta que:
//! - el estado coincide con el objetivo (éxito),
//! - la consulta misma falla (se propaga sin reintentar), o
//! - se excede el timeout (`PollError::Timeout`).
//!
//! No hay backoff. El sleep previo a la siguiente consulta se recorta al
//! tiempo restante, así un recurso que nunca llega falla en `timeout` más a lo
//! sumo una consulta.

use std::fmt;
use std::thread;
use std::time::{Duration, Instant};

use log::debug;
use thiserror::Error;

use crate::constants::{DEFAULT_WAIT_TIMEOUT, SHUTDOWN_POLL_INTERVAL, STATE_POLL_INTERVAL};

/// Cadencia y deadline de una espera.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    pub timeout: Duration,
}

impl PollConfig {
    pub const fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }

    /// Cadencia de estados de recursos (2s) con el timeout por defecto.
    pub const fn state() -> Self {
        Self::new(STATE_POLL_INTERVAL, DEFAULT_WAIT_TIMEOUT)
    }

    /// Cadencia de apagado (10s) con el timeout dado.
    pub const fn shutdown(timeout: Duration) -> Self {
        Self::new(SHUTDOWN_POLL_INTERVAL, timeout)
    }

    pub const fn with_timeout(self, timeout: Duration) -> Self {
        Self { timeout, ..self }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::state()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PollError<E> {
    #[error("timed out after {elapsed:?} waiting for {resource} to be {desired}")]
    Timeout { resource: String, desired: String, elapsed: Duration },
    #[error(transparent)]
    Fetch(E),
}

/// Consulta `fetch` hasta que devuelva `Some`.
///
/// `resource` y `desired` sólo se usan para el mensaje de timeout.
pub fn wait_for_condition<T, E, F>(config: PollConfig,
                                   resource: &str,
                                   desired: &str,
                                   mut fetch: F)
                                   -> Result<T, PollError<E>>
    where F: FnMut() -> Result<Option<T>, E>
{
    let started = Instant::now();
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        if let Some(value) = fetch().map_err(PollError::Fetch)? {
            debug!("{resource} reached {desired} after {attempt} attempt(s)");
            return Ok(value);
        }

        let elapsed = started.elapsed();
        if elapsed >= config.timeout {
            return Err(PollError::Timeout { resource: resource.to_string(),
                                            desired: desired.to_string(),
                                            elapsed });
        }
        debug!("{resource} not yet {desired} (attempt {attempt}, {elapsed:?} elapsed)");
        thread::sleep(config.interval.min(config.timeout - elapsed));
    }
}

/// Consulta el estado (string) hasta que sea alguno de `targets`.
pub fn wait_for_state<S, E, F>(config: PollConfig,
                               resource: &str,
                               targets: &[&str],
                               mut fetch: F)
                               -> Result<S, PollError<E>>
    where S: AsRef<str>,
          F: FnMut() -> Result<S, E>
{
    let desired = Targets(targets).to_string();
    wait_for_condition(config, resource, &desired, || {
        let state = fetch()?;
        Ok(targets.contains(&state.as_ref()).then_some(state))
    })
}

struct Targets<'a>(&'a [&'a str]);

impl fmt::Display for Targets<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(" or "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_of_multiple_targets() {
        assert_eq!(Targets(&["stopped", "terminated"]).to_string(), "stopped or terminated");
    }

    #[test]
    fn fetch_error_is_not_retried() {
        let mut calls = 0;
        let res: Result<String, PollError<&str>> =
            wait_for_state(PollConfig::new(Duration::from_millis(1), Duration::from_secs(5)),
                           "instance i-1",
                           &["running"],
                           || {
                               calls += 1;
                               Err("boom")
                           });
        assert_eq!(res, Err(PollError::Fetch("boom")));
        assert_eq!(calls, 1);
    }
}
