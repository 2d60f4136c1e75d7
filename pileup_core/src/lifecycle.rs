//! One-shot lifecycle of a digitizer stage.
//!
//! ```text
//!          attempt_run (non-empty)            pass returns
//!   Idle ──────────────────────────▶ Processing ───────────▶ Finished
//!    ▲                                   │                      │
//!    └──────── pass deferred ────────────┘                      └─▶ every later call: no-op
//! ```

use serde::{Deserialize, Serialize};

/// Where a stage is in its lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GateState {
    /// Waiting for the first useful input
    #[default]
    Idle,
    /// The merge pass is running
    Processing,
    /// The pass has run; the stage is inert
    Finished,
}

/// What a pass reports back to the gate.
#[derive(Debug, Clone, PartialEq)]
pub enum PassVerdict<T> {
    /// The pass did its work
    Done(T),
    /// Nothing to do yet; wait for another input
    Deferred,
}

/// What an invocation of the gate amounted to.
#[derive(Debug, Clone, PartialEq)]
pub enum GateOutcome<T> {
    /// The pass ran to completion on this call
    Ran(T),
    /// The pass found nothing to do; the gate is idle again
    Deferred,
    /// The gate was already finished; nothing happened
    Inert,
}

impl<T> GateOutcome<T> {
    /// Returns the pass result if the pass ran on this call.
    pub fn ran(self) -> Option<T> {
        match self {
            Self::Ran(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_inert(&self) -> bool {
        matches!(self, Self::Inert)
    }
}

/// Runs a pass exactly once per gate.
#[derive(Debug, Default)]
pub struct LifecycleGate {
    state: GateState,
}

impl LifecycleGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state == GateState::Finished
    }

    /// Runs `pass` unless the gate is finished.
    ///
    /// A deferred pass puts the gate back to `Idle`. A pass that completes or
    /// fails leaves it `Finished`: a failed pass is never retried.
    pub fn attempt_run<T, E, F>(&mut self, pass: F) -> Result<GateOutcome<T>, E>
    where
        F: FnOnce() -> Result<PassVerdict<T>, E>,
    {
        if self.state != GateState::Idle {
            return Ok(GateOutcome::Inert);
        }

        self.state = GateState::Processing;
        match pass() {
            Ok(PassVerdict::Done(value)) => {
                self.state = GateState::Finished;
                Ok(GateOutcome::Ran(value))
            }
            Ok(PassVerdict::Deferred) => {
                self.state = GateState::Idle;
                Ok(GateOutcome::Deferred)
            }
            Err(err) => {
                self.state = GateState::Finished;
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_idle() {
        assert_eq!(GateState::default(), GateState::Idle);
        assert_eq!(LifecycleGate::default().state(), GateState::Idle);
        assert!(!LifecycleGate::new().is_finished());
    }

    #[test]
    fn test_runs_once() {
        let mut gate = LifecycleGate::new();
        let mut calls = 0;

        let first: Result<_, ()> = gate.attempt_run(|| {
            calls += 1;
            Ok(PassVerdict::Done(7))
        });
        assert_eq!(first, Ok(GateOutcome::Ran(7)));
        assert!(gate.is_finished());

        let second: Result<GateOutcome<i32>, ()> = gate.attempt_run(|| {
            calls += 1;
            Ok(PassVerdict::Done(8))
        });
        assert_eq!(second, Ok(GateOutcome::Inert));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_deferred_returns_to_idle() {
        let mut gate = LifecycleGate::new();

        let out: Result<GateOutcome<()>, ()> = gate.attempt_run(|| Ok(PassVerdict::Deferred));
        assert_eq!(out, Ok(GateOutcome::Deferred));
        assert_eq!(gate.state(), GateState::Idle);

        let out: Result<_, ()> = gate.attempt_run(|| Ok(PassVerdict::Done("ok")));
        assert_eq!(out.unwrap().ran(), Some("ok"));
    }

    #[test]
    fn test_failed_pass_is_not_retried() {
        let mut gate = LifecycleGate::new();

        let out: Result<GateOutcome<()>, &str> = gate.attempt_run(|| Err("sink closed"));
        assert_eq!(out, Err("sink closed"));
        assert_eq!(gate.state(), GateState::Finished);

        let out: Result<GateOutcome<()>, &str> = gate.attempt_run(|| Ok(PassVerdict::Done(())));
        assert!(out.unwrap().is_inert());
    }
}
