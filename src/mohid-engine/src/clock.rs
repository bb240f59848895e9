// Copyright 2026 The MOHID Access Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! In-process engine that honours a project's time control.
//!
//! `ClockEngine` reads the same descriptor files MOHID Land reads and walks
//! the simulation clock from `START` to `END` the way the native engine's
//! time loop does, without computing any physics.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tracing::{debug, info, trace};

use crate::common::Result;
use crate::descriptor::Descriptor;
use crate::engine::{Engine, MODEL_ID};
use crate::instant::{duration_from_seconds, format_instant, seconds_between};
use crate::window::TimeWindow;
use crate::{misuse_err, sim_err};

#[derive(Debug)]
pub struct ClockEngine {
    model_path: PathBuf,
    window: TimeWindow,
    current: NaiveDateTime,
    dt: f64,
    steps: u64,
    finished: bool,
}

impl ClockEngine {
    /// Builds an engine straight from a time window, positioned at its start.
    pub fn from_window(model_path: PathBuf, window: TimeWindow) -> Result<Self> {
        window.validate()?;
        Ok(ClockEngine {
            model_path,
            current: window.start,
            dt: window.dt,
            window,
            steps: 0,
            finished: false,
        })
    }

    /// The model data file the time window was read from.
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn steps_taken(&self) -> u64 {
        self.steps
    }

    pub fn is_complete(&self) -> bool {
        self.current >= self.window.stop
    }

    fn bad_step<T>(&self) -> Result<T> {
        sim_err!(
            BadStep,
            format!(
                "time step of {} s at {} cannot advance the clock",
                self.dt,
                format_instant(&self.current)
            )
        )
    }

    fn check_live(&self) -> Result<()> {
        if self.finished {
            return misuse_err!(AlreadyFinished, "engine has been finished".to_string());
        }
        Ok(())
    }
}

impl Engine for ClockEngine {
    /// Accepts either a `nomfich.dat`-style file index, whose `IN_MODEL`
    /// entry names the model data file, or the model data file itself.
    fn load(path: &Path) -> Result<Self> {
        let descriptor = Descriptor::open(path)?;
        let model = match descriptor.get_path("IN_MODEL") {
            Some(model_path) => {
                debug!(index = %path.display(), model = %model_path.display(), "following IN_MODEL");
                Descriptor::open(&model_path)?
            }
            None => descriptor,
        };

        let window = TimeWindow::from_descriptor(&model)?;
        info!(
            model = %model.path().display(),
            start = %format_instant(&window.start),
            stop = %format_instant(&window.stop),
            dt = window.dt,
            variable_dt = window.variable_dt,
            "loaded project"
        );

        ClockEngine::from_window(model.path().to_path_buf(), window)
    }

    fn run_simulation(&mut self) -> Result<()> {
        self.check_live()?;
        if self.is_complete() {
            debug!("run requested on a completed simulation");
            return Ok(());
        }

        let first_step = self.steps;
        info!(from = %format_instant(&self.current), "running simulation");
        while self.perform_time_step()? {}
        info!(
            steps = self.steps - first_step,
            at = %format_instant(&self.current),
            "simulation complete"
        );
        Ok(())
    }

    fn perform_time_step(&mut self) -> Result<bool> {
        self.check_live()?;
        if self.is_complete() {
            return Ok(false);
        }

        if !(self.dt > 0.0 && self.dt.is_finite()) {
            return self.bad_step();
        }

        // a step reaching past stop is clipped before it is turned into a
        // Duration, which cannot hold arbitrarily large steps
        let remaining = seconds_between(&self.current, &self.window.stop);
        self.current = if self.dt >= remaining {
            self.window.stop
        } else {
            match duration_from_seconds(self.dt) {
                Some(step) if step.num_nanoseconds() != Some(0) => self.current + step,
                _ => return self.bad_step(),
            }
        };
        self.steps += 1;
        trace!(step = self.steps, dt = self.dt, at = %format_instant(&self.current));

        if self.window.variable_dt {
            self.dt = (self.dt * self.window.dt_factor).min(self.window.max_dt);
        }

        Ok(true)
    }

    fn finish(&mut self) -> Result<()> {
        self.check_live()?;
        self.finished = true;
        info!(steps = self.steps, "engine finished");
        Ok(())
    }

    fn model_id(&self) -> Result<String> {
        Ok(MODEL_ID.to_string())
    }

    fn start_instant(&self) -> Result<NaiveDateTime> {
        Ok(self.window.start)
    }

    fn stop_instant(&self) -> Result<NaiveDateTime> {
        Ok(self.window.stop)
    }

    fn current_instant(&self) -> Result<NaiveDateTime> {
        Ok(self.current)
    }

    fn current_time_step(&self) -> Result<f64> {
        Ok(self.dt)
    }

    fn time_window(&self) -> Result<TimeWindow> {
        Ok(self.window.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{ErrorCode, ErrorKind};
    use crate::instant::parse_instant;
    use proptest::prelude::*;

    fn engine(start: &str, stop: &str, dt: f64) -> ClockEngine {
        let window = TimeWindow::new(parse_instant(start).unwrap(), parse_instant(stop).unwrap(), dt);
        ClockEngine::from_window(PathBuf::from("Model.dat"), window).unwrap()
    }

    #[test]
    fn fixed_steps_land_on_stop() {
        let mut engine = engine("2002 1 1 0 0 0", "2002 1 1 12 0 0", 5.0);
        assert_eq!(engine.start_instant().unwrap(), engine.current_instant().unwrap());

        engine.run_simulation().unwrap();

        assert_eq!(8640, engine.steps_taken());
        assert_eq!(engine.stop_instant().unwrap(), engine.current_instant().unwrap());
        assert_eq!(5.0, engine.current_time_step().unwrap());
        assert!(engine.is_complete());
    }

    #[test]
    fn single_steps_advance_by_dt() {
        let mut engine = engine("2002 1 1 0 0 0", "2002 1 1 0 0 15", 5.0);
        assert!(engine.perform_time_step().unwrap());
        assert_eq!(
            parse_instant("2002 1 1 0 0 5").unwrap(),
            engine.current_instant().unwrap()
        );
        assert!(engine.perform_time_step().unwrap());
        assert!(engine.perform_time_step().unwrap());
        assert!(!engine.perform_time_step().unwrap());
        assert_eq!(3, engine.steps_taken());
    }

    #[test]
    fn rerunning_a_completed_simulation_is_a_no_op() {
        let mut engine = engine("2002 1 1 0 0 0", "2002 1 1 0 1 0", 5.0);
        engine.run_simulation().unwrap();
        engine.run_simulation().unwrap();
        assert_eq!(12, engine.steps_taken());
    }

    #[test]
    fn adaptive_steps_grow_up_to_max_dt_and_clip_at_stop() {
        let mut window = TimeWindow::new(
            parse_instant("2002 1 1 0 0 0").unwrap(),
            parse_instant("2002 1 1 0 1 0").unwrap(),
            1.0,
        );
        window.variable_dt = true;
        window.dt_factor = 2.0;
        window.max_dt = 16.0;
        let mut engine = ClockEngine::from_window(PathBuf::from("Model.dat"), window).unwrap();

        let mut steps = Vec::new();
        while engine.perform_time_step().unwrap() {
            steps.push(engine.current_instant().unwrap());
        }

        // 1 + 2 + 4 + 8 + 16 + 16 = 47, then a clipped 13 second step
        let seconds: Vec<u32> = steps
            .iter()
            .map(|t| (*t - parse_instant("2002 1 1 0 0 0").unwrap()).num_seconds() as u32)
            .collect();
        assert_eq!(vec![1, 3, 7, 15, 31, 47, 60], seconds);
        assert_eq!(16.0, engine.current_time_step().unwrap());
    }

    #[test]
    fn huge_adaptive_steps_are_clipped_to_stop() {
        let mut window = TimeWindow::new(
            parse_instant("2002 1 1 0 0 0").unwrap(),
            parse_instant("2012 1 1 0 0 0").unwrap(),
            1.0,
        );
        window.variable_dt = true;
        window.dt_factor = 1e6;
        window.max_dt = 1e15;
        let mut engine = ClockEngine::from_window(PathBuf::from("Model.dat"), window).unwrap();

        engine.run_simulation().unwrap();

        // 1 s, 1e6 s, then a 1e12 s step clipped to the end of the decade
        assert_eq!(3, engine.steps_taken());
        assert_eq!(engine.stop_instant().unwrap(), engine.current_instant().unwrap());
        assert!(engine.is_complete());
    }

    #[test]
    fn finished_engine_rejects_further_work() {
        let mut engine = engine("2002 1 1 0 0 0", "2002 1 1 0 1 0", 5.0);
        engine.finish().unwrap();

        let err = engine.perform_time_step().unwrap_err();
        assert_eq!(ErrorKind::Misuse, err.kind);
        assert_eq!(ErrorCode::AlreadyFinished, err.code);

        let err = engine.finish().unwrap_err();
        assert_eq!(ErrorCode::AlreadyFinished, err.code);
    }

    #[test]
    fn window_is_validated() {
        let window = TimeWindow::new(
            parse_instant("2002 1 1 0 0 0").unwrap(),
            parse_instant("2002 1 1 0 0 0").unwrap(),
            5.0,
        );
        let err = ClockEngine::from_window(PathBuf::from("Model.dat"), window).unwrap_err();
        assert_eq!(ErrorCode::BadTimeWindow, err.code);
    }

    proptest! {
        #[test]
        fn adaptive_runs_never_overshoot(
            period in 1i64..5_000,
            dt in 0.5f64..600.0,
            factor in 1.0f64..3.0,
            max_factor in 1.0f64..50.0,
        ) {
            let start = parse_instant("2002 1 1 0 0 0").unwrap();
            let stop = start + chrono::Duration::seconds(period);
            let mut window = TimeWindow::new(start, stop, dt);
            window.variable_dt = true;
            window.dt_factor = factor;
            window.max_dt = dt * max_factor;
            let mut engine = ClockEngine::from_window(PathBuf::from("Model.dat"), window).unwrap();

            let mut previous = start;
            while engine.perform_time_step().unwrap() {
                let now = engine.current_instant().unwrap();
                prop_assert!(now > previous);
                prop_assert!(now <= stop);
                previous = now;
            }
            prop_assert_eq!(stop, engine.current_instant().unwrap());
        }
    }
}
