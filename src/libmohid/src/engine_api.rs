// Copyright 2026 The MOHID Access Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Engine lifecycle FFI functions.
//!
//! Creating and freeing engine objects, initializing them from a project
//! descriptor, running and stepping, finishing, and reading the model
//! identity and time window.

use std::os::raw::{c_char, c_double};
use std::ptr;

use mohid_engine::chrono::NaiveDateTime;
use mohid_engine::Result as EngineResult;
use tracing::debug;

use crate::ffi_try;
use crate::{
    clear_out_error, ffi_error_from_engine, require_engine, require_path, store_ffi_error,
    string_to_c, EngineAccess, FfiError, MohidEngine, MohidErrorCode, MohidInstant, OutError,
};

/// Creates an engine object in the uninitialized state.
/// Free it with `mohid_engine_free`.
#[no_mangle]
pub extern "C" fn mohid_engine_new() -> *mut MohidEngine {
    Box::into_raw(Box::new(MohidEngine::new()))
}

/// Frees an engine object. A live engine is finished first.
///
/// # Safety
/// - `engine` must be null or a pointer returned by `mohid_engine_new`
///   that has not been freed
#[no_mangle]
pub unsafe extern "C" fn mohid_engine_free(engine: *mut MohidEngine) {
    if engine.is_null() {
        return;
    }
    let engine = Box::from_raw(engine);
    if engine.lock().is_initialized() {
        debug!("freeing a live engine");
    }
    drop(engine);
}

/// Loads the project descriptor at `path` (a `nomfich.dat` file index or
/// a model data file).
///
/// # Safety
/// - `engine` must be a valid pointer to a MohidEngine
/// - `path` must be a valid NUL-terminated string
/// - `out_error` may be null
#[no_mangle]
pub unsafe extern "C" fn mohid_engine_initialize(
    engine: *mut MohidEngine,
    path: *const c_char,
    out_error: OutError,
) {
    clear_out_error(out_error);
    let engine = ffi_try!(out_error, require_engine(engine));
    let path = ffi_try!(out_error, require_path(path));
    if let Err(err) = engine.lock().initialize(path) {
        store_ffi_error(out_error, ffi_error_from_engine(&err));
    }
}

/// Runs the simulation from the current instant to the stop instant.
///
/// # Safety
/// - `engine` must be a valid pointer to a MohidEngine
/// - `out_error` may be null
#[no_mangle]
pub unsafe extern "C" fn mohid_engine_run_simulation(engine: *mut MohidEngine, out_error: OutError) {
    clear_out_error(out_error);
    let engine = ffi_try!(out_error, require_engine(engine));
    if let Err(err) = engine.lock().run_simulation() {
        store_ffi_error(out_error, ffi_error_from_engine(&err));
    }
}

/// Advances by one time step. Returns false, without stepping, once the
/// stop instant has been reached, and on error.
///
/// # Safety
/// - `engine` must be a valid pointer to a MohidEngine
/// - `out_error` may be null
#[no_mangle]
pub unsafe extern "C" fn mohid_engine_perform_time_step(
    engine: *mut MohidEngine,
    out_error: OutError,
) -> bool {
    clear_out_error(out_error);
    let engine = ffi_try!(out_error, require_engine(engine), false);
    match engine.lock().perform_time_step() {
        Ok(stepped) => stepped,
        Err(err) => {
            store_ffi_error(out_error, ffi_error_from_engine(&err));
            false
        }
    }
}

/// Releases everything the engine holds. The engine object itself stays
/// allocated until `mohid_engine_free`; every later call on it fails with
/// `AlreadyFinished`.
///
/// # Safety
/// - `engine` must be a valid pointer to a MohidEngine
/// - `out_error` may be null
#[no_mangle]
pub unsafe extern "C" fn mohid_engine_finish(engine: *mut MohidEngine, out_error: OutError) {
    clear_out_error(out_error);
    let engine = ffi_try!(out_error, require_engine(engine));
    if let Err(err) = engine.lock().finish() {
        store_ffi_error(out_error, ffi_error_from_engine(&err));
    }
}

/// Returns the model identity. The caller frees it with `mohid_free_string`.
///
/// # Safety
/// - `engine` must be a valid pointer to a MohidEngine
/// - `out_error` may be null
#[no_mangle]
pub unsafe extern "C" fn mohid_engine_get_model_id(
    engine: *mut MohidEngine,
    out_error: OutError,
) -> *mut c_char {
    clear_out_error(out_error);
    let engine = ffi_try!(out_error, require_engine(engine), ptr::null_mut());
    match engine.lock().model_id() {
        Ok(id) => string_to_c(id),
        Err(err) => {
            store_ffi_error(out_error, ffi_error_from_engine(&err));
            ptr::null_mut()
        }
    }
}

unsafe fn write_instant(
    engine: *mut MohidEngine,
    out: *mut MohidInstant,
    out_error: OutError,
    query: fn(&EngineAccess) -> EngineResult<NaiveDateTime>,
) {
    clear_out_error(out_error);
    let engine = ffi_try!(out_error, require_engine(engine));
    if out.is_null() {
        store_ffi_error(
            out_error,
            FfiError::new(MohidErrorCode::Generic).with_message("output pointer must not be NULL"),
        );
        return;
    }
    match query(&engine.lock()) {
        Ok(instant) => *out = MohidInstant::from(instant),
        Err(err) => store_ffi_error(out_error, ffi_error_from_engine(&err)),
    }
}

/// Writes the start of the simulation window to `out`.
///
/// # Safety
/// - `engine` must be a valid pointer to a MohidEngine
/// - `out` must be a valid pointer to a MohidInstant
/// - `out_error` may be null
#[no_mangle]
pub unsafe extern "C" fn mohid_engine_get_start_instant(
    engine: *mut MohidEngine,
    out: *mut MohidInstant,
    out_error: OutError,
) {
    write_instant(engine, out, out_error, EngineAccess::start_instant)
}

/// Writes the end of the simulation window to `out`.
///
/// # Safety
/// - `engine` must be a valid pointer to a MohidEngine
/// - `out` must be a valid pointer to a MohidInstant
/// - `out_error` may be null
#[no_mangle]
pub unsafe extern "C" fn mohid_engine_get_stop_instant(
    engine: *mut MohidEngine,
    out: *mut MohidInstant,
    out_error: OutError,
) {
    write_instant(engine, out, out_error, EngineAccess::stop_instant)
}

/// Writes the simulation clock to `out`.
///
/// # Safety
/// - `engine` must be a valid pointer to a MohidEngine
/// - `out` must be a valid pointer to a MohidInstant
/// - `out_error` may be null
#[no_mangle]
pub unsafe extern "C" fn mohid_engine_get_current_instant(
    engine: *mut MohidEngine,
    out: *mut MohidInstant,
    out_error: OutError,
) {
    write_instant(engine, out, out_error, EngineAccess::current_instant)
}

/// Writes the current time step, in seconds, to `out`.
///
/// # Safety
/// - `engine` must be a valid pointer to a MohidEngine
/// - `out` must be a valid pointer to a double
/// - `out_error` may be null
#[no_mangle]
pub unsafe extern "C" fn mohid_engine_get_current_time_step(
    engine: *mut MohidEngine,
    out: *mut c_double,
    out_error: OutError,
) {
    clear_out_error(out_error);
    let engine = ffi_try!(out_error, require_engine(engine));
    if out.is_null() {
        store_ffi_error(
            out_error,
            FfiError::new(MohidErrorCode::Generic).with_message("output pointer must not be NULL"),
        );
        return;
    }
    match engine.lock().current_time_step() {
        Ok(dt) => *out = dt,
        Err(err) => store_ffi_error(out_error, ffi_error_from_engine(&err)),
    }
}

/// Returns the time window as a JSON object with `start`, `stop`, `dt`,
/// `variable_dt`, `max_dt` and `dt_factor`. The caller frees it with
/// `mohid_free_string`.
///
/// # Safety
/// - `engine` must be a valid pointer to a MohidEngine
/// - `out_error` may be null
#[no_mangle]
pub unsafe extern "C" fn mohid_engine_get_time_window_json(
    engine: *mut MohidEngine,
    out_error: OutError,
) -> *mut c_char {
    clear_out_error(out_error);
    let engine = ffi_try!(out_error, require_engine(engine), ptr::null_mut());
    let window = match engine.lock().time_window() {
        Ok(window) => window,
        Err(err) => {
            store_ffi_error(out_error, ffi_error_from_engine(&err));
            return ptr::null_mut();
        }
    };
    match serde_json::to_string(&window) {
        Ok(json) => string_to_c(json),
        Err(err) => {
            store_ffi_error(
                out_error,
                FfiError::new(MohidErrorCode::Generic)
                    .with_message(format!("failed to serialize time window: {err}")),
            );
            ptr::null_mut()
        }
    }
}
