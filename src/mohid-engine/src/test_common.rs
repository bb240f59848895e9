// Copyright 2026 The MOHID Access Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Common test infrastructure for building MOHID projects on disk
//!
//! `TestProject` writes a `nomfich.dat` file index and the model data file
//! it points at into a temporary directory laid out like a MOHID Land
//! project (`exe/` next to `data/`). `ScriptedEngine` wraps the clock
//! engine and can be told to fail, for exercising error paths.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::NaiveDateTime;
use tempfile::TempDir;

use crate::clock::ClockEngine;
use crate::common::Result;
use crate::engine::Engine;
use crate::sim_err;
use crate::window::TimeWindow;

/// Builder for MOHID project fixtures
pub struct TestProject {
    pub name: String,
    pub keywords: Vec<(String, String)>,
    pub with_file_index: bool,
}

/// A project written to disk. The directory is removed on drop.
pub struct TestFixture {
    pub dir: TempDir,
    /// The path to hand to `initialize`.
    pub descriptor: PathBuf,
    pub model: PathBuf,
}

impl TestProject {
    /// A half-day run on 2002-01-01 with a fixed 5 second step.
    pub fn new(name: &str) -> Self {
        TestProject {
            name: name.to_string(),
            keywords: vec![
                ("START".to_string(), "2002 1 1 0 0 0".to_string()),
                ("END".to_string(), "2002 1 1 12 0 0".to_string()),
                ("DT".to_string(), "5.".to_string()),
                ("VARIABLEDT".to_string(), "0".to_string()),
            ],
            with_file_index: true,
        }
    }

    /// Set simulation time parameters
    pub fn with_sim_time(self, start: &str, end: &str, dt: &str) -> Self {
        self.keyword("START", start)
            .keyword("END", end)
            .keyword("DT", dt)
    }

    /// Set a keyword, replacing any earlier value
    pub fn keyword(mut self, key: &str, value: &str) -> Self {
        match self.keywords.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.keywords.push((key.to_string(), value.to_string())),
        }
        self
    }

    pub fn without_keyword(mut self, key: &str) -> Self {
        self.keywords.retain(|(k, _)| k != key);
        self
    }

    /// Hand the model data file to `initialize` directly instead of going
    /// through `nomfich.dat`
    pub fn model_only(mut self) -> Self {
        self.with_file_index = false;
        self
    }

    pub fn model_source(&self) -> String {
        let mut source = format!("! {} test project\n", self.name);
        for (key, value) in &self.keywords {
            source.push_str(&format!("{key:<26}: {value}\n"));
        }
        source
    }

    pub fn write(&self) -> TestFixture {
        let dir = tempfile::Builder::new()
            .prefix(&format!("mohid-{}-", self.name))
            .tempdir()
            .unwrap();
        let exe = dir.path().join("exe");
        let data = dir.path().join("data");
        fs::create_dir_all(&exe).unwrap();
        fs::create_dir_all(&data).unwrap();

        let model = data.join("Model_1.dat");
        fs::write(&model, self.model_source()).unwrap();

        let descriptor = if self.with_file_index {
            let index = exe.join("nomfich.dat");
            fs::write(
                &index,
                "IN_MODEL                  : ..\\data\\Model_1.dat\n\
                 ROOT_SRT                  : ..\\res\\\n",
            )
            .unwrap();
            index
        } else {
            model.clone()
        };

        TestFixture {
            dir,
            descriptor,
            model,
        }
    }
}

impl TestFixture {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// Counters shared between a `ScriptedEngine` and the test observing it.
#[derive(Clone, Debug, Default)]
pub struct EngineProbe {
    finishes: Arc<AtomicUsize>,
    steps: Arc<AtomicUsize>,
}

impl EngineProbe {
    pub fn finishes(&self) -> usize {
        self.finishes.load(Ordering::SeqCst)
    }

    pub fn steps(&self) -> usize {
        self.steps.load(Ordering::SeqCst)
    }
}

/// Clock engine that can be scripted to fail after a number of steps.
pub struct ScriptedEngine {
    inner: ClockEngine,
    fail_after: Option<usize>,
    probe: EngineProbe,
}

impl ScriptedEngine {
    pub fn new(window: TimeWindow) -> Self {
        ScriptedEngine {
            inner: ClockEngine::from_window(PathBuf::from("Model.dat"), window).unwrap(),
            fail_after: None,
            probe: EngineProbe::default(),
        }
    }

    pub fn failing_after(mut self, steps: usize) -> Self {
        self.fail_after = Some(steps);
        self
    }

    pub fn probe(&self) -> EngineProbe {
        self.probe.clone()
    }
}

impl Engine for ScriptedEngine {
    fn load(path: &Path) -> Result<Self> {
        Ok(ScriptedEngine {
            inner: ClockEngine::load(path)?,
            fail_after: None,
            probe: EngineProbe::default(),
        })
    }

    fn run_simulation(&mut self) -> Result<()> {
        while self.perform_time_step()? {}
        Ok(())
    }

    fn perform_time_step(&mut self) -> Result<bool> {
        if self.fail_after == Some(self.probe.steps()) {
            return sim_err!(
                NativeFailure,
                format!("scripted failure after {} steps", self.probe.steps())
            );
        }
        let stepped = self.inner.perform_time_step()?;
        if stepped {
            self.probe.steps.fetch_add(1, Ordering::SeqCst);
        }
        Ok(stepped)
    }

    fn finish(&mut self) -> Result<()> {
        self.probe.finishes.fetch_add(1, Ordering::SeqCst);
        self.inner.finish()
    }

    fn model_id(&self) -> Result<String> {
        self.inner.model_id()
    }

    fn start_instant(&self) -> Result<NaiveDateTime> {
        self.inner.start_instant()
    }

    fn stop_instant(&self) -> Result<NaiveDateTime> {
        self.inner.stop_instant()
    }

    fn current_instant(&self) -> Result<NaiveDateTime> {
        self.inner.current_instant()
    }

    fn current_time_step(&self) -> Result<f64> {
        self.inner.current_time_step()
    }
}
