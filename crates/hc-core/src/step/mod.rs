//! Definiciones relacionadas a Steps.
//!
//! Un Step es una unidad del pipeline de aprovisionamiento con dos
//! operaciones: `run` (avanza o detiene el flujo) y `cleanup` (se invoca en
//! orden inverso sobre todo step que arrancó, haya terminado bien o no).

pub mod definition;
mod status;

pub use definition::{Step, StepAction};
pub use status::RunStatus;
