//! Contrato del estado compartido de una corrida.
//!
//! El estado concreto (recursos creados, config, clientes) vive en el crate
//! de adapters; el core sólo necesita:
//! - saber si una clave está poblada (`contains`) para verificar
//!   prerequisitos antes de ejecutar un step;
//! - acceder a las señales terminales (`error`, `cancelled`, `halted`).

use std::fmt::{Debug, Display};

use crate::errors::CoreEngineError;

/// Estado tipado por corrida que el runner pasa por referencia a cada step.
pub trait StepState {
    /// Nombre de cada campo producible (p.ej. `Disk`, `Instance`).
    type Key: Copy + Debug + Display + PartialEq;
    /// Error que los steps escriben en la ranura `error`.
    type Error: From<CoreEngineError>;

    fn contains(&self, key: Self::Key) -> bool;
    fn signals(&self) -> &RunSignals<Self::Error>;
    fn signals_mut(&mut self) -> &mut RunSignals<Self::Error>;
}

/// Señales centinela: se escriben una sola vez y el runner las lee al final.
#[derive(Debug)]
pub struct RunSignals<E> {
    error: Option<E>,
    cancelled: bool,
    halted: bool,
}

impl<E> Default for RunSignals<E> {
    fn default() -> Self {
        Self { error: None,
               cancelled: false,
               halted: false }
    }
}

impl<E> RunSignals<E> {
    /// Registra el error del build. Gana el primero: errores posteriores
    /// (típicamente de cleanup) no reemplazan la causa original.
    pub fn fail(&mut self, error: E) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    pub fn mark_cancelled(&mut self) {
        self.cancelled = true;
    }

    pub fn mark_halted(&mut self) {
        self.halted = true;
    }

    pub fn error(&self) -> Option<&E> {
        self.error.as_ref()
    }

    pub fn take_error(&mut self) -> Option<E> {
        self.error.take()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// `true` si la corrida no terminó limpia. Los cleanups lo usan para
    /// decidir si deben liberar recursos que, en éxito, son el artifact.
    pub fn is_failed(&self) -> bool {
        self.error.is_some() || self.cancelled || self.halted
    }
}
