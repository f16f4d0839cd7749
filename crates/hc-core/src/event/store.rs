use std::collections::HashMap;

use chrono::Utc;
use log::trace;
use uuid::Uuid;

use super::{RunEvent, RunEventKind};

/// Traza append-only de las corridas.
pub trait EventStore {
    /// Registra `kind` como siguiente evento de `run_id` (asigna seq y ts).
    fn append_kind(&mut self, run_id: Uuid, kind: RunEventKind) -> RunEvent;
    /// Eventos de la corrida en orden de seq.
    fn list(&self, run_id: Uuid) -> Vec<RunEvent>;
}

#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    pub inner: HashMap<Uuid, Vec<RunEvent>>,
}

impl EventStore for InMemoryEventStore {
    fn append_kind(&mut self, run_id: Uuid, kind: RunEventKind) -> RunEvent {
        let events = self.inner.entry(run_id).or_default();
        let ev = RunEvent { seq: events.len() as u64,
                            run_id,
                            kind,
                            ts: Utc::now() };
        trace!("run {run_id} #{}: {:?}", ev.seq, ev.kind);
        events.push(ev.clone());
        ev
    }

    fn list(&self, run_id: Uuid) -> Vec<RunEvent> {
        self.inner.get(&run_id).cloned().unwrap_or_default()
    }
}
