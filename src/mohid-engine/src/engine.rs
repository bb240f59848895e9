// Copyright 2026 The MOHID Access Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::path::Path;

use chrono::NaiveDateTime;

use crate::common::Result;
use crate::window::TimeWindow;

/// Identity string MOHID Land reports for itself.
pub const MODEL_ID: &str = "MOHID Land Model";

/// One loaded instance of a simulation engine.
///
/// Implementations do not track lifecycle misuse beyond what they need to
/// stay memory safe; [`crate::EngineHandle`] guarantees `finish` is called
/// exactly once and that nothing is called afterwards.
pub trait Engine {
    /// Loads the project described by the file at `path`.
    fn load(path: &Path) -> Result<Self>
    where
        Self: Sized;

    /// Runs from the current instant to the stop instant, blocking.
    fn run_simulation(&mut self) -> Result<()>;

    /// Advances by one step. Returns `false`, without stepping, once the
    /// stop instant has been reached.
    fn perform_time_step(&mut self) -> Result<bool>;

    /// Releases everything the instance holds.
    fn finish(&mut self) -> Result<()>;

    fn model_id(&self) -> Result<String>;

    fn start_instant(&self) -> Result<NaiveDateTime>;

    fn stop_instant(&self) -> Result<NaiveDateTime>;

    fn current_instant(&self) -> Result<NaiveDateTime>;

    /// The step in seconds the next `perform_time_step` will take.
    fn current_time_step(&self) -> Result<f64>;

    fn time_window(&self) -> Result<TimeWindow> {
        Ok(TimeWindow::new(
            self.start_instant()?,
            self.stop_instant()?,
            self.current_time_step()?,
        ))
    }
}
