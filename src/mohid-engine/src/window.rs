// Copyright 2026 The MOHID Access Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::common::Result;
use crate::descriptor::Descriptor;
use crate::init_err;
use crate::instant::{duration_from_seconds, format_instant};

fn required<T>(descriptor: &Descriptor, key: &str, value: Option<T>) -> Result<T> {
    match value {
        Some(value) => Ok(value),
        None => init_err!(
            MissingKeyword,
            format!("{key} in {}", descriptor.path().display())
        ),
    }
}

/// The time control of a loaded project: the run period and how it is
/// stepped. Fixed for the lifetime of an engine handle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: NaiveDateTime,
    pub stop: NaiveDateTime,
    /// Initial (and, without `variable_dt`, constant) step in seconds.
    pub dt: f64,
    pub variable_dt: bool,
    /// Upper bound for the step when `variable_dt` is set.
    pub max_dt: f64,
    /// Growth applied to the step after each step when `variable_dt` is set.
    pub dt_factor: f64,
}

impl TimeWindow {
    /// A fixed-step window.
    pub fn new(start: NaiveDateTime, stop: NaiveDateTime, dt: f64) -> Self {
        TimeWindow {
            start,
            stop,
            dt,
            variable_dt: false,
            max_dt: dt,
            dt_factor: 1.0,
        }
    }

    /// Reads `START`, `END`, `DT`, `VARIABLEDT`, `MAXDT` and `DTFACTOR`
    /// from a model data file.
    pub fn from_descriptor(descriptor: &Descriptor) -> Result<Self> {
        let start = required(descriptor, "START", descriptor.get_instant("START")?)?;
        let stop = required(descriptor, "END", descriptor.get_instant("END")?)?;
        let dt = required(descriptor, "DT", descriptor.get_f64("DT")?)?;
        let variable_dt = descriptor.get_bool("VARIABLEDT")?.unwrap_or(false);
        let max_dt = descriptor.get_f64("MAXDT")?.unwrap_or(dt);
        let dt_factor = descriptor.get_f64("DTFACTOR")?.unwrap_or(1.0);

        let window = TimeWindow {
            start,
            stop,
            dt,
            variable_dt,
            max_dt,
            dt_factor,
        };
        window.validate()?;
        Ok(window)
    }

    pub fn validate(&self) -> Result<()> {
        if self.stop <= self.start {
            return init_err!(
                BadTimeWindow,
                format!(
                    "END ({}) must be after START ({})",
                    format_instant(&self.stop),
                    format_instant(&self.start)
                )
            );
        }
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return init_err!(BadTimeStep, format!("DT must be positive, got {}", self.dt));
        }
        let Some(dt) = duration_from_seconds(self.dt).filter(|dt| dt.num_nanoseconds() != Some(0))
        else {
            return init_err!(BadTimeStep, format!("DT of {} seconds is unusable", self.dt));
        };

        if self.variable_dt {
            if !self.max_dt.is_finite() || self.max_dt < self.dt {
                return init_err!(
                    BadTimeStep,
                    format!("MAXDT ({}) must not be below DT ({})", self.max_dt, self.dt)
                );
            }
            if !self.dt_factor.is_finite() || self.dt_factor < 1.0 {
                return init_err!(
                    BadTimeStep,
                    format!("DTFACTOR must be at least 1, got {}", self.dt_factor)
                );
            }
            return Ok(());
        }

        let period = self.stop - self.start;
        let divides = match (period.num_nanoseconds(), dt.num_nanoseconds()) {
            (Some(period), Some(dt)) => period % dt == 0,
            _ => false,
        };
        if !divides {
            return init_err!(
                DtNotSubmultiple,
                format!(
                    "DT ({} s) does not divide the run period ({} s)",
                    self.dt,
                    period.num_milliseconds() as f64 / 1e3
                )
            );
        }

        Ok(())
    }

    pub fn duration_seconds(&self) -> f64 {
        crate::instant::seconds_between(&self.start, &self.stop)
    }

    /// Number of steps a fixed-step run takes. `None` with adaptive stepping.
    pub fn step_count(&self) -> Option<u64> {
        if self.variable_dt {
            return None;
        }
        let period = (self.stop - self.start).num_nanoseconds()?;
        let dt = duration_from_seconds(self.dt)?.num_nanoseconds()?;
        if dt <= 0 {
            return None;
        }
        u64::try_from(period / dt).ok()
    }
}
