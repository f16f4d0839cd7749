use serde::{Deserialize, Serialize};

/// Estado de una corrida.
///
/// Las transiciones válidas son:
/// - `Pending` -> `Running`
/// - `Running` -> `Completed` | `Halted` | `Cancelled`
///
/// No se permiten reversiones: un runner es de un solo uso.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    /// Aún no se llamó `run`.
    Pending,
    /// Ejecutando steps o cleanups.
    Running,
    /// Todos los steps devolvieron `Continue`.
    Completed,
    /// Algún step pidió `Halt` (o faltó un prerequisito).
    Halted,
    /// El host levantó la señal de cancelación.
    Cancelled,
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Halted | RunStatus::Cancelled)
    }
}
