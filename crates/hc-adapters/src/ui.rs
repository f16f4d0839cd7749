//! Salida hacia el usuario del build.
//!
//! Los steps narran lo que hacen con `say`, reportan el error fatal con
//! `error` y las fallas best-effort (teardown) con `warn`. El log técnico va
//! aparte, por la fachada `log`.

use std::sync::Mutex;

use log::{error, info, warn};

pub trait Ui: Send + Sync {
    fn say(&self, msg: &str);
    fn error(&self, msg: &str);
    fn warn(&self, msg: &str);
}

/// Reenvía todo al logger del proceso.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogUi;

impl Ui for LogUi {
    fn say(&self, msg: &str) {
        info!("==> {msg}");
    }

    fn error(&self, msg: &str) {
        error!("==> {msg}");
    }

    fn warn(&self, msg: &str) {
        warn!("==> {msg}");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiLevel {
    Say,
    Error,
    Warn,
}

/// Guarda los mensajes en memoria (tests).
#[derive(Debug, Default)]
pub struct MemoryUi {
    lines: Mutex<Vec<(UiLevel, String)>>,
}

impl MemoryUi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<(UiLevel, String)> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    pub fn messages(&self, level: UiLevel) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m)
            .collect()
    }

    fn push(&self, level: UiLevel, msg: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push((level, msg.to_string()));
        }
    }
}

impl Ui for MemoryUi {
    fn say(&self, msg: &str) {
        self.push(UiLevel::Say, msg);
    }

    fn error(&self, msg: &str) {
        self.push(UiLevel::Error, msg);
    }

    fn warn(&self, msg: &str) {
        self.push(UiLevel::Warn, msg);
    }
}
