// Copyright 2026 The MOHID Access Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::path::Path;

use chrono::NaiveDateTime;
use tracing::{info, warn};

use crate::common::Result;
use crate::engine::Engine;
use crate::window::TimeWindow;
use crate::DefaultEngine;

/// Exclusive owner of one loaded engine instance.
///
/// `finish` consumes the handle, so nothing can reach the engine after it
/// has been released. A handle dropped without `finish` (including while
/// unwinding from a failed `run_simulation`) finishes the engine itself.
pub struct EngineHandle<E: Engine = DefaultEngine> {
    engine: E,
    released: bool,
}

impl<E: Engine> EngineHandle<E> {
    pub fn initialize(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!(descriptor = %path.display(), "initializing engine");
        let engine = E::load(path)?;
        Ok(EngineHandle::from_engine(engine))
    }

    /// Takes ownership of an engine that has already been loaded.
    pub fn from_engine(engine: E) -> Self {
        EngineHandle {
            engine,
            released: false,
        }
    }

    pub fn run_simulation(&mut self) -> Result<()> {
        self.engine.run_simulation()
    }

    pub fn perform_time_step(&mut self) -> Result<bool> {
        self.engine.perform_time_step()
    }

    /// Releases the engine. Whatever the outcome, the engine is not
    /// finished a second time when the handle is dropped.
    pub fn finish(mut self) -> Result<()> {
        self.released = true;
        self.engine.finish()
    }

    pub fn model_id(&self) -> Result<String> {
        self.engine.model_id()
    }

    pub fn start_instant(&self) -> Result<NaiveDateTime> {
        self.engine.start_instant()
    }

    pub fn stop_instant(&self) -> Result<NaiveDateTime> {
        self.engine.stop_instant()
    }

    pub fn current_instant(&self) -> Result<NaiveDateTime> {
        self.engine.current_instant()
    }

    pub fn current_time_step(&self) -> Result<f64> {
        self.engine.current_time_step()
    }

    pub fn time_window(&self) -> Result<TimeWindow> {
        self.engine.time_window()
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }
}

impl<E: Engine> Drop for EngineHandle<E> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        warn!("engine handle dropped without finish, releasing it");
        if let Err(err) = self.engine.finish() {
            warn!(error = %err, "implicit finish failed");
        }
    }
}
