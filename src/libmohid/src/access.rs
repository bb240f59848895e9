// Copyright 2026 The MOHID Access Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Lifecycle state machine for hosts that hold the engine behind a
//! long-lived object instead of an owned `EngineHandle`.
//!
//! Every operation checks the state first, so calls made before
//! `initialize` or after `finish` fail with a `MisuseError` instead of
//! reaching the engine.

use std::fmt;
use std::path::Path;

use mohid_engine::chrono::NaiveDateTime;
use mohid_engine::{misuse_err, DefaultEngine, Engine, EngineHandle, Result, TimeWindow};
use tracing::{debug, info};

enum State<E: Engine> {
    Uninitialized,
    Initialized(EngineHandle<E>),
    Finished,
}

impl<E: Engine> fmt::Debug for State<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            State::Uninitialized => "Uninitialized",
            State::Initialized(_) => "Initialized",
            State::Finished => "Finished",
        };
        write!(f, "{name}")
    }
}

/// Owns at most one engine over its whole life: `Uninitialized`, then
/// `Initialized`, then `Finished`. `Finished` is terminal; initializing a
/// second time takes a new `EngineAccess`.
pub struct EngineAccess<E: Engine = DefaultEngine> {
    state: State<E>,
}

impl<E: Engine> Default for EngineAccess<E> {
    fn default() -> Self {
        EngineAccess::new()
    }
}

impl<E: Engine> EngineAccess<E> {
    pub fn new() -> Self {
        EngineAccess {
            state: State::Uninitialized,
        }
    }

    /// Loads the project at `path`. On failure the access stays
    /// uninitialized and `initialize` can be retried.
    pub fn initialize(&mut self, path: impl AsRef<Path>) -> Result<()> {
        match self.state {
            State::Uninitialized => {}
            State::Initialized(_) => {
                return misuse_err!(
                    AlreadyInitialized,
                    "initialize called on a live engine".to_string()
                );
            }
            State::Finished => {
                return misuse_err!(
                    AlreadyFinished,
                    "initialize called after finish".to_string()
                );
            }
        }

        let handle = EngineHandle::initialize(path)?;
        info!("engine access initialized");
        self.state = State::Initialized(handle);
        Ok(())
    }

    /// Adopts an engine that was loaded elsewhere.
    pub fn attach(&mut self, engine: E) -> Result<()> {
        match self.state {
            State::Uninitialized => {
                self.state = State::Initialized(EngineHandle::from_engine(engine));
                Ok(())
            }
            State::Initialized(_) => misuse_err!(AlreadyInitialized),
            State::Finished => misuse_err!(AlreadyFinished),
        }
    }

    pub fn run_simulation(&mut self) -> Result<()> {
        self.live_mut("run_simulation")?.run_simulation()
    }

    pub fn perform_time_step(&mut self) -> Result<bool> {
        self.live_mut("perform_time_step")?.perform_time_step()
    }

    /// Releases the engine. The access is `Finished` afterwards even when
    /// the engine reports an error while shutting down.
    pub fn finish(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.state, State::Finished) {
            State::Initialized(handle) => handle.finish(),
            State::Uninitialized => {
                self.state = State::Uninitialized;
                misuse_err!(NotInitialized, "finish called before initialize".to_string())
            }
            State::Finished => misuse_err!(AlreadyFinished, "finish called twice".to_string()),
        }
    }

    pub fn model_id(&self) -> Result<String> {
        self.live("model_id")?.model_id()
    }

    pub fn start_instant(&self) -> Result<NaiveDateTime> {
        self.live("start_instant")?.start_instant()
    }

    pub fn stop_instant(&self) -> Result<NaiveDateTime> {
        self.live("stop_instant")?.stop_instant()
    }

    pub fn current_instant(&self) -> Result<NaiveDateTime> {
        self.live("current_instant")?.current_instant()
    }

    pub fn current_time_step(&self) -> Result<f64> {
        self.live("current_time_step")?.current_time_step()
    }

    pub fn time_window(&self) -> Result<TimeWindow> {
        self.live("time_window")?.time_window()
    }

    pub fn is_initialized(&self) -> bool {
        matches!(self.state, State::Initialized(_))
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, State::Finished)
    }

    fn live(&self, op: &str) -> Result<&EngineHandle<E>> {
        match self.state {
            State::Initialized(ref handle) => Ok(handle),
            ref state => out_of_order(op, state),
        }
    }

    fn live_mut(&mut self, op: &str) -> Result<&mut EngineHandle<E>> {
        match self.state {
            State::Initialized(ref mut handle) => Ok(handle),
            ref state => out_of_order(op, state),
        }
    }
}

fn out_of_order<T, E: Engine>(op: &str, state: &State<E>) -> Result<T> {
    debug!(op, ?state, "rejected out of order call");
    match state {
        State::Finished => misuse_err!(AlreadyFinished, format!("{op} called after finish")),
        _ => misuse_err!(NotInitialized, format!("{op} called before initialize")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mohid_engine::test_common::{ScriptedEngine, TestProject};
    use mohid_engine::{ClockEngine, ErrorCode, ErrorKind};

    fn assert_misuse<T: std::fmt::Debug>(result: Result<T>, code: ErrorCode) {
        let err = result.unwrap_err();
        assert_eq!(ErrorKind::Misuse, err.kind);
        assert_eq!(code, err.code);
    }

    #[test]
    fn queries_before_initialize_are_misuse() {
        let mut access = EngineAccess::<ClockEngine>::new();
        assert!(!access.is_initialized());
        assert_misuse(access.model_id(), ErrorCode::NotInitialized);
        assert_misuse(access.start_instant(), ErrorCode::NotInitialized);
        assert_misuse(access.stop_instant(), ErrorCode::NotInitialized);
        assert_misuse(access.current_instant(), ErrorCode::NotInitialized);
        assert_misuse(access.current_time_step(), ErrorCode::NotInitialized);
        assert_misuse(access.time_window(), ErrorCode::NotInitialized);
        assert_misuse(access.run_simulation(), ErrorCode::NotInitialized);
        assert_misuse(access.perform_time_step(), ErrorCode::NotInitialized);
        assert_misuse(access.finish(), ErrorCode::NotInitialized);
        // still usable
        assert!(!access.is_finished());
    }

    #[test]
    fn full_lifecycle() {
        let fixture = TestProject::new("access").write();
        let mut access = EngineAccess::<ClockEngine>::new();
        access.initialize(&fixture.descriptor).unwrap();
        assert!(access.is_initialized());
        assert_eq!("MOHID Land Model", access.model_id().unwrap());

        assert_misuse(
            access.initialize(&fixture.descriptor),
            ErrorCode::AlreadyInitialized,
        );

        access.run_simulation().unwrap();
        assert_eq!(access.stop_instant().unwrap(), access.current_instant().unwrap());
        access.finish().unwrap();
        assert!(access.is_finished());

        assert_misuse(access.model_id(), ErrorCode::AlreadyFinished);
        assert_misuse(access.current_time_step(), ErrorCode::AlreadyFinished);
        assert_misuse(access.run_simulation(), ErrorCode::AlreadyFinished);
        assert_misuse(access.finish(), ErrorCode::AlreadyFinished);
        assert_misuse(
            access.initialize(&fixture.descriptor),
            ErrorCode::AlreadyFinished,
        );

        let mut again = EngineAccess::<ClockEngine>::default();
        again.initialize(&fixture.descriptor).unwrap();
        again.run_simulation().unwrap();
        again.finish().unwrap();
    }

    #[test]
    fn failed_initialize_can_be_retried() {
        let mut access = EngineAccess::<ClockEngine>::new();
        let err = access.initialize("/no/such/nomfich.dat").unwrap_err();
        assert_eq!(ErrorKind::Initialization, err.kind);
        assert!(!access.is_initialized());
        assert!(!access.is_finished());

        let fixture = TestProject::new("retry").write();
        access.initialize(&fixture.descriptor).unwrap();
        access.finish().unwrap();
    }

    #[test]
    fn dropping_a_live_access_finishes_the_engine() {
        let fixture = TestProject::new("scripted").write();
        let engine = ScriptedEngine::load(&fixture.descriptor).unwrap();
        let probe = engine.probe();
        {
            let mut access = EngineAccess::new();
            access.attach(engine).unwrap();
            assert!(access.perform_time_step().unwrap());
        }
        assert_eq!(1, probe.steps());
        assert_eq!(1, probe.finishes());
    }

    #[test]
    fn simulation_errors_leave_the_engine_live() {
        let fixture = TestProject::new("failing").write();
        let engine = ScriptedEngine::load(&fixture.descriptor)
            .unwrap()
            .failing_after(2);
        let probe = engine.probe();

        let mut access = EngineAccess::new();
        access.attach(engine).unwrap();
        let err = access.run_simulation().unwrap_err();
        assert_eq!(ErrorKind::Simulation, err.kind);
        assert!(access.is_initialized());

        access.finish().unwrap();
        assert_eq!(2, probe.steps());
        assert_eq!(1, probe.finishes());
    }
}
