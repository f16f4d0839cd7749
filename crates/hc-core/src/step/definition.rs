use crate::state::StepState;

/// Decisión de un step tras ejecutarse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepAction {
    Continue,
    Halt,
}

/// Trait que define un Step sobre el estado `S`.
///
/// `cleanup` debe tolerar estado parcialmente poblado: puede invocarse aunque
/// `run` haya hecho `Halt` a mitad de camino.
pub trait Step<S: StepState> {
    /// Identificador estable y único dentro del pipeline.
    fn id(&self) -> &str;

    /// Claves que deben estar pobladas antes de `run`. El runner las verifica
    /// y detiene el flujo con `MissingState` si falta alguna.
    fn requires(&self) -> Vec<S::Key> {
        Vec::new()
    }

    fn run(&mut self, state: &mut S) -> StepAction;

    fn cleanup(&mut self, _state: &mut S) {}
}
