use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use hc_core::{CancelToken, CoreEngineError, FlowRunner, RunSignals, RunStatus, Step, StepAction, StepState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NoKey {}

impl fmt::Display for NoKey {
    fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}

#[derive(Default)]
struct Trace {
    signals: RunSignals<CoreEngineError>,
}

impl StepState for Trace {
    type Key = NoKey;
    type Error = CoreEngineError;

    fn contains(&self, key: NoKey) -> bool {
        match key {}
    }
    fn signals(&self) -> &RunSignals<CoreEngineError> {
        &self.signals
    }
    fn signals_mut(&mut self) -> &mut RunSignals<CoreEngineError> {
        &mut self.signals
    }
}

type Log = Rc<RefCell<Vec<String>>>;

struct Recorder {
    id: String,
    halt: bool,
    cancel_on_run: Option<CancelToken>,
    log: Log,
}

impl Recorder {
    fn new(index: usize, halt: bool, log: &Log) -> Self {
        Self { id: format!("s{index}"),
               halt,
               cancel_on_run: None,
               log: log.clone() }
    }
}

impl Step<Trace> for Recorder {
    fn id(&self) -> &str {
        &self.id
    }

    fn run(&mut self, state: &mut Trace) -> StepAction {
        self.log.borrow_mut().push(format!("run:{}", self.id));
        if let Some(token) = &self.cancel_on_run {
            token.cancel();
        }
        if self.halt {
            state.signals_mut().fail(CoreEngineError::Internal(format!("{} falló", self.id)));
            return StepAction::Halt;
        }
        StepAction::Continue
    }

    fn cleanup(&mut self, _state: &mut Trace) {
        self.log.borrow_mut().push(format!("cleanup:{}", self.id));
    }
}

fn cleanups(log: &Log) -> Vec<String> {
    log.borrow()
       .iter()
       .filter_map(|e| e.strip_prefix("cleanup:").map(str::to_string))
       .collect()
}

#[test]
fn halt_at_step_k_unwinds_exactly_one_to_k_in_reverse() {
    let n = 6;
    for k in 1..=n {
        let log: Log = Rc::default();
        let mut builder = FlowRunner::builder();
        for i in 1..=n {
            builder = builder.add_step(Recorder::new(i, i == k, &log));
        }
        let mut runner = builder.build();
        let mut state = Trace::default();

        let status = runner.run(&mut state).expect("la corrida debería ejecutarse");

        assert_eq!(status, RunStatus::Halted, "k={k}");
        let expected: Vec<String> = (1..=k).rev().map(|i| format!("s{i}")).collect();
        assert_eq!(cleanups(&log), expected, "k={k}");
        assert_eq!(runner.cleanup_order(), expected, "k={k}");
        // ningún step posterior al halt llegó a ejecutarse
        assert!(!log.borrow().iter().any(|e| e == &format!("run:s{}", k + 1)));
        assert!(matches!(state.signals.error(), Some(CoreEngineError::Internal(m)) if m == &format!("s{k} falló")));
    }
}

#[test]
fn successful_run_still_unwinds_every_step() {
    let log: Log = Rc::default();
    let mut runner = FlowRunner::builder().add_step(Recorder::new(1, false, &log))
                                          .add_step(Recorder::new(2, false, &log))
                                          .add_step(Recorder::new(3, false, &log))
                                          .build();
    let mut state = Trace::default();
    let status = runner.run(&mut state).expect("la corrida debería ejecutarse");
    assert_eq!(status, RunStatus::Completed);
    assert!(!state.signals.is_failed());
    assert_eq!(cleanups(&log), vec!["s3", "s2", "s1"]);
}

#[test]
fn cancellation_during_a_step_stops_before_the_next_one() {
    let log: Log = Rc::default();
    let token = CancelToken::new();
    let mut second = Recorder::new(2, false, &log);
    second.cancel_on_run = Some(token.clone());

    let mut runner = FlowRunner::builder().add_step(Recorder::new(1, false, &log))
                                          .add_step(second)
                                          .add_step(Recorder::new(3, false, &log))
                                          .cancel_token(token)
                                          .build();
    let mut state = Trace::default();
    let status = runner.run(&mut state).expect("la corrida debería ejecutarse");

    assert_eq!(status, RunStatus::Cancelled);
    assert!(state.signals.is_cancelled());
    assert_eq!(*log.borrow(), vec!["run:s1", "run:s2", "cleanup:s2", "cleanup:s1"]);
    assert_eq!(runner.event_variants(), vec!["I", "S", "F", "S", "F", "X", "U", "U", "C"]);
}

#[test]
fn cancelled_before_start_runs_nothing() {
    let log: Log = Rc::default();
    let token = CancelToken::new();
    token.cancel();
    let mut runner = FlowRunner::builder().add_step(Recorder::new(1, false, &log))
                                          .cancel_token(token)
                                          .build();
    let mut state = Trace::default();
    assert_eq!(runner.run(&mut state), Ok(RunStatus::Cancelled));
    assert!(log.borrow().is_empty());
    assert_eq!(runner.event_variants(), vec!["I", "X", "C"]);
}
