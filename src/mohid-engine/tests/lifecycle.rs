// Copyright 2026 The MOHID Access Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use float_cmp::approx_eq;

use mohid_engine::chrono::NaiveDate;
use mohid_engine::test_common::{ScriptedEngine, TestProject};
use mohid_engine::{ClockEngine, EngineHandle, ErrorCode, ErrorKind, TimeWindow, MODEL_ID};

fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> mohid_engine::chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d)
        .unwrap()
        .and_hms_opt(h, mi, s)
        .unwrap()
}

#[test]
fn reports_identity_and_time_window() {
    let fixture = TestProject::new("identity").write();
    let handle = EngineHandle::<ClockEngine>::initialize(&fixture.descriptor).unwrap();

    assert_eq!(MODEL_ID, handle.model_id().unwrap());
    assert_eq!("MOHID Land Model", handle.model_id().unwrap());
    assert_eq!(at(2002, 1, 1, 0, 0, 0), handle.start_instant().unwrap());
    assert_eq!(at(2002, 1, 1, 12, 0, 0), handle.stop_instant().unwrap());
    assert!(approx_eq!(f64, 5.0, handle.current_time_step().unwrap(), ulps = 2));
    assert_eq!(
        fixture.model.canonicalize().unwrap(),
        handle.engine().model_path().canonicalize().unwrap()
    );

    handle.finish().unwrap();
}

#[test]
fn queries_are_stable_across_calls() {
    let fixture = TestProject::new("stable").write();
    let mut handle = EngineHandle::<ClockEngine>::initialize(&fixture.descriptor).unwrap();

    let start = handle.start_instant().unwrap();
    let stop = handle.stop_instant().unwrap();
    for _ in 0..3 {
        assert_eq!(start, handle.start_instant().unwrap());
        assert_eq!(stop, handle.stop_instant().unwrap());
    }

    handle.run_simulation().unwrap();
    assert_eq!(start, handle.start_instant().unwrap());
    assert_eq!(stop, handle.stop_instant().unwrap());
    assert_eq!(stop, handle.current_instant().unwrap());

    handle.finish().unwrap();
}

#[test]
fn model_file_can_be_loaded_directly() {
    let fixture = TestProject::new("direct").model_only().write();
    let handle = EngineHandle::<ClockEngine>::initialize(&fixture.descriptor).unwrap();
    assert_eq!(at(2002, 1, 1, 12, 0, 0), handle.stop_instant().unwrap());
    handle.finish().unwrap();
}

#[test]
fn sub_second_instants_survive_loading() {
    let fixture = TestProject::new("subsecond")
        .with_sim_time("2002 1 1 0 0 0.5", "2002 1 1 0 0 10.5", "0.5")
        .write();
    let handle = EngineHandle::<ClockEngine>::initialize(&fixture.descriptor).unwrap();
    let start = handle.start_instant().unwrap();
    assert_eq!(
        at(2002, 1, 1, 0, 0, 0) + mohid_engine::chrono::Duration::milliseconds(500),
        start
    );
    assert_eq!(Some(20), handle.time_window().unwrap().step_count());
    handle.finish().unwrap();
}

#[test]
fn reinitialize_after_finish() {
    let fixture = TestProject::new("cycle").write();
    for _ in 0..2 {
        let mut handle = EngineHandle::<ClockEngine>::initialize(&fixture.descriptor).unwrap();
        handle.run_simulation().unwrap();
        handle.finish().unwrap();
    }
}

#[test]
fn initialization_failures() {
    let err = EngineHandle::<ClockEngine>::initialize("/no/such/project/nomfich.dat")
        .err()
        .unwrap();
    assert_eq!(ErrorKind::Initialization, err.kind);
    assert_eq!(ErrorCode::DoesNotExist, err.code);

    let fixture = TestProject::new("no-start").without_keyword("START").write();
    let err = EngineHandle::<ClockEngine>::initialize(&fixture.descriptor)
        .err()
        .unwrap();
    assert_eq!(ErrorKind::Initialization, err.kind);
    assert_eq!(ErrorCode::MissingKeyword, err.code);

    let fixture = TestProject::new("bad-dt").keyword("DT", "7").write();
    let err = EngineHandle::<ClockEngine>::initialize(&fixture.descriptor)
        .err()
        .unwrap();
    assert_eq!(ErrorCode::DtNotSubmultiple, err.code);

    // the file index points at a model file that is not there
    let fixture = TestProject::new("dangling").write();
    std::fs::remove_file(&fixture.model).unwrap();
    let err = EngineHandle::<ClockEngine>::initialize(&fixture.descriptor)
        .err()
        .unwrap();
    assert_eq!(ErrorCode::DoesNotExist, err.code);
}

#[test]
fn adaptive_projects_report_the_current_step() {
    let fixture = TestProject::new("adaptive")
        .keyword("VARIABLEDT", "1")
        .keyword("MAXDT", "60")
        .keyword("DTFACTOR", "2")
        .write();
    let mut handle = EngineHandle::<ClockEngine>::initialize(&fixture.descriptor).unwrap();

    assert!(approx_eq!(f64, 5.0, handle.current_time_step().unwrap(), ulps = 2));
    assert!(handle.perform_time_step().unwrap());
    assert!(approx_eq!(f64, 10.0, handle.current_time_step().unwrap(), ulps = 2));

    handle.run_simulation().unwrap();
    assert!(approx_eq!(f64, 60.0, handle.current_time_step().unwrap(), ulps = 2));
    assert_eq!(handle.stop_instant().unwrap(), handle.current_instant().unwrap());
    assert!(!handle.perform_time_step().unwrap());

    handle.finish().unwrap();
}

fn short_window() -> TimeWindow {
    TimeWindow::new(at(2002, 1, 1, 0, 0, 0), at(2002, 1, 1, 0, 1, 0), 5.0)
}

#[test]
fn dropped_handle_releases_the_engine() {
    let engine = ScriptedEngine::new(short_window());
    let probe = engine.probe();
    {
        let mut handle = EngineHandle::from_engine(engine);
        handle.perform_time_step().unwrap();
    }
    assert_eq!(1, probe.finishes());
}

#[test]
fn explicit_finish_is_not_repeated_on_drop() {
    let engine = ScriptedEngine::new(short_window());
    let probe = engine.probe();
    let mut handle = EngineHandle::from_engine(engine);
    handle.run_simulation().unwrap();
    handle.finish().unwrap();
    assert_eq!(12, probe.steps());
    assert_eq!(1, probe.finishes());
}

#[test]
fn simulation_failures_propagate_and_still_release() {
    let engine = ScriptedEngine::new(short_window()).failing_after(3);
    let probe = engine.probe();

    let result = {
        let mut handle = EngineHandle::from_engine(engine);
        handle.run_simulation()
    };

    let err = result.unwrap_err();
    assert_eq!(ErrorKind::Simulation, err.kind);
    assert_eq!(ErrorCode::NativeFailure, err.code);
    assert_eq!(3, probe.steps());
    assert_eq!(1, probe.finishes());
}
