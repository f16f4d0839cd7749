//! Tipos de evento de una corrida y estructura `RunEvent`.
//!
//! Rol en el flujo:
//! - El `FlowRunner` emite un evento por transición a un `EventStore`
//!   append-only.
//! - La traza permite verificar el orden de ejecución y de unwind sin
//!   instrumentar los steps.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::step::RunStatus;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunEventKind {
    /// Primer evento de un `run_id`.
    RunInitialized { step_count: usize },
    /// Un step comenzó su ejecución. No implica éxito.
    StepStarted { step_index: usize, step_id: String },
    /// El step devolvió `Continue`.
    StepFinished { step_index: usize, step_id: String },
    /// El step devolvió `Halt` o no tenía sus prerequisitos.
    StepHalted { step_index: usize, step_id: String, reason: Option<String> },
    /// Cancelación observada en el borde del step `step_index`.
    RunCancelled { step_index: usize },
    /// Cleanup invocado (orden inverso al de ejecución).
    CleanupInvoked { step_index: usize, step_id: String },
    /// Cierre de la corrida con su estado terminal.
    RunCompleted { status: RunStatus },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunEvent {
    pub seq: u64, // asignado por el store (orden append)
    pub run_id: Uuid,
    pub kind: RunEventKind,
    pub ts: DateTime<Utc>,
}
