// Copyright 2026 The MOHID Access Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! C-compatible access to the MOHID Land engine.
//!
//! A host creates a `MohidEngine` with `mohid_engine_new`, initializes it
//! from a project descriptor, runs or steps it, queries it, and finishes
//! it. Every fallible call takes a `MohidError **out_error` which is set
//! to NULL on success and to an owned error object on failure; the caller
//! frees it with `mohid_error_free`. Strings returned by the API are freed
//! with `mohid_free_string`.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;
use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{Error as AnyError, Result};
use mohid_engine::chrono::{Datelike, NaiveDateTime, Timelike};
use mohid_engine::instant::second_of_minute;
use mohid_engine::{self as engine, DefaultEngine};

mod access;
pub mod engine_api;
mod ffi_error;
pub mod logging;

pub use access::EngineAccess;
pub use ffi_error::{FfiError, MohidError};

/// Error codes for the C API
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MohidErrorCode {
    /// Success - no error
    NoError = 0,
    DoesNotExist = 1,
    Io = 2,
    UnterminatedBlock = 3,
    UnexpectedBlockEnd = 4,
    MissingKeyword = 5,
    BadKeywordValue = 6,
    BadInstant = 7,
    BadTimeWindow = 8,
    BadTimeStep = 9,
    DtNotSubmultiple = 10,
    EngineBusy = 11,
    NotInitialized = 12,
    AlreadyInitialized = 13,
    AlreadyFinished = 14,
    BadStep = 15,
    NativeFailure = 16,
    Generic = 17,
}

impl TryFrom<u32> for MohidErrorCode {
    type Error = ();

    fn try_from(value: u32) -> std::result::Result<Self, Self::Error> {
        use MohidErrorCode::*;
        let code = match value {
            0 => NoError,
            1 => DoesNotExist,
            2 => Io,
            3 => UnterminatedBlock,
            4 => UnexpectedBlockEnd,
            5 => MissingKeyword,
            6 => BadKeywordValue,
            7 => BadInstant,
            8 => BadTimeWindow,
            9 => BadTimeStep,
            10 => DtNotSubmultiple,
            11 => EngineBusy,
            12 => NotInitialized,
            13 => AlreadyInitialized,
            14 => AlreadyFinished,
            15 => BadStep,
            16 => NativeFailure,
            17 => Generic,
            _ => return Err(()),
        };
        Ok(code)
    }
}

impl From<engine::ErrorCode> for MohidErrorCode {
    fn from(code: engine::ErrorCode) -> Self {
        match code {
            engine::ErrorCode::DoesNotExist => MohidErrorCode::DoesNotExist,
            engine::ErrorCode::Io => MohidErrorCode::Io,
            engine::ErrorCode::UnterminatedBlock => MohidErrorCode::UnterminatedBlock,
            engine::ErrorCode::UnexpectedBlockEnd => MohidErrorCode::UnexpectedBlockEnd,
            engine::ErrorCode::MissingKeyword => MohidErrorCode::MissingKeyword,
            engine::ErrorCode::BadKeywordValue => MohidErrorCode::BadKeywordValue,
            engine::ErrorCode::BadInstant => MohidErrorCode::BadInstant,
            engine::ErrorCode::BadTimeWindow => MohidErrorCode::BadTimeWindow,
            engine::ErrorCode::BadTimeStep => MohidErrorCode::BadTimeStep,
            engine::ErrorCode::DtNotSubmultiple => MohidErrorCode::DtNotSubmultiple,
            engine::ErrorCode::EngineBusy => MohidErrorCode::EngineBusy,
            engine::ErrorCode::NotInitialized => MohidErrorCode::NotInitialized,
            engine::ErrorCode::AlreadyInitialized => MohidErrorCode::AlreadyInitialized,
            engine::ErrorCode::AlreadyFinished => MohidErrorCode::AlreadyFinished,
            engine::ErrorCode::BadStep => MohidErrorCode::BadStep,
            engine::ErrorCode::NativeFailure => MohidErrorCode::NativeFailure,
            engine::ErrorCode::Generic => MohidErrorCode::Generic,
        }
    }
}

/// Lifecycle phase an error belongs to.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MohidErrorKind {
    Initialization = 0,
    Misuse = 1,
    Simulation = 2,
}

impl From<engine::ErrorKind> for MohidErrorKind {
    fn from(kind: engine::ErrorKind) -> Self {
        match kind {
            engine::ErrorKind::Initialization => MohidErrorKind::Initialization,
            engine::ErrorKind::Misuse => MohidErrorKind::Misuse,
            engine::ErrorKind::Simulation => MohidErrorKind::Simulation,
        }
    }
}

/// The phase a code is raised in when nothing more specific is known.
/// Bad arguments at the boundary (`Generic`) count as misuse.
impl From<MohidErrorCode> for MohidErrorKind {
    fn from(code: MohidErrorCode) -> Self {
        use MohidErrorCode::*;
        match code {
            DoesNotExist | Io | UnterminatedBlock | UnexpectedBlockEnd | MissingKeyword
            | BadKeywordValue | BadInstant | BadTimeWindow | BadTimeStep | DtNotSubmultiple
            | EngineBusy => MohidErrorKind::Initialization,
            BadStep | NativeFailure => MohidErrorKind::Simulation,
            NoError | NotInitialized | AlreadyInitialized | AlreadyFinished | Generic => {
                MohidErrorKind::Misuse
            }
        }
    }
}

/// Calendar instant. `second` carries the fractional part.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MohidInstant {
    pub year: f64,
    pub month: f64,
    pub day: f64,
    pub hour: f64,
    pub minute: f64,
    pub second: f64,
}

impl From<NaiveDateTime> for MohidInstant {
    fn from(instant: NaiveDateTime) -> Self {
        MohidInstant {
            year: instant.year() as f64,
            month: instant.month() as f64,
            day: instant.day() as f64,
            hour: instant.hour() as f64,
            minute: instant.minute() as f64,
            second: second_of_minute(&instant),
        }
    }
}

/// Opaque engine structure
pub struct MohidEngine {
    access: Mutex<EngineAccess<DefaultEngine>>,
}

impl MohidEngine {
    fn new() -> Self {
        MohidEngine {
            access: Mutex::new(EngineAccess::new()),
        }
    }

    /// A panic while the lock was held leaves the state machine intact,
    /// so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, EngineAccess<DefaultEngine>> {
        self.access.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

type OutError = *mut *mut MohidError;

fn clear_out_error(out_error: OutError) {
    if out_error.is_null() {
        return;
    }
    unsafe {
        *out_error = ptr::null_mut();
    }
}

fn store_error(out_error: OutError, error: MohidError) {
    if out_error.is_null() {
        return;
    }
    unsafe {
        *out_error = error.into_raw();
    }
}

fn store_ffi_error(out_error: OutError, error: FfiError) {
    store_error(out_error, error.into_mohid_error());
}

fn error_from_anyhow(err: AnyError) -> MohidError {
    if let Some(ffi_error) = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<FfiError>())
    {
        return ffi_error.clone().into_mohid_error();
    }
    if let Some(engine_error) = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<engine::Error>())
    {
        return ffi_error_from_engine(engine_error).into_mohid_error();
    }

    let mut error = MohidError::new(MohidErrorCode::Generic);
    error.set_message(Some(err.to_string()));
    error
}

fn store_anyhow_error(out_error: OutError, err: AnyError) {
    store_error(out_error, error_from_anyhow(err));
}

macro_rules! ffi_try {
    ($out_error:expr, $expr:expr) => {
        match $expr {
            Ok(value) => value,
            Err(err) => {
                $crate::store_anyhow_error($out_error, err);
                return;
            }
        }
    };
    ($out_error:expr, $expr:expr, $failed:expr) => {
        match $expr {
            Ok(value) => value,
            Err(err) => {
                $crate::store_anyhow_error($out_error, err);
                return $failed;
            }
        }
    };
}
pub(crate) use ffi_try;

unsafe fn require_engine<'a>(engine: *mut MohidEngine) -> Result<&'a MohidEngine> {
    if engine.is_null() {
        Err(FfiError::new(MohidErrorCode::Generic)
            .with_message("engine pointer must not be NULL")
            .into())
    } else {
        Ok(&*engine)
    }
}

unsafe fn require_path(path: *const c_char) -> Result<String> {
    if path.is_null() {
        return Err(FfiError::new(MohidErrorCode::Generic)
            .with_message("descriptor path must not be NULL")
            .into());
    }
    match CStr::from_ptr(path).to_str() {
        Ok(path) => Ok(path.to_string()),
        Err(err) => Err(FfiError::new(MohidErrorCode::Generic)
            .with_message(format!("descriptor path is not valid UTF-8: {err}"))
            .into()),
    }
}

fn ffi_error_from_engine(error: &engine::Error) -> FfiError {
    let ffi_error = FfiError::new(MohidErrorCode::from(error.code))
        .with_kind(MohidErrorKind::from(error.kind))
        .with_message(error.to_string());
    match error.details {
        Some(ref details) => ffi_error.with_detail(details.clone()),
        None => ffi_error,
    }
}

fn string_to_c(value: String) -> *mut c_char {
    ffi_error::sanitize_for_c(value).into_raw()
}

unsafe fn drop_c_string(s: *mut c_char) {
    if s.is_null() {
        return;
    }
    let _ = CString::from_raw(s);
}

/// mohid_error_str returns a string representation of an error code.
/// The returned string must not be freed or modified.
///
/// Accepts a u32 discriminant rather than an enum to safely handle invalid
/// values from C callers. Returns "unknown_error" for invalid discriminants.
#[no_mangle]
pub extern "C" fn mohid_error_str(err: u32) -> *const c_char {
    let s: &'static str = match MohidErrorCode::try_from(err) {
        Ok(MohidErrorCode::NoError) => "no_error\0",
        Ok(MohidErrorCode::DoesNotExist) => "does_not_exist\0",
        Ok(MohidErrorCode::Io) => "io\0",
        Ok(MohidErrorCode::UnterminatedBlock) => "unterminated_block\0",
        Ok(MohidErrorCode::UnexpectedBlockEnd) => "unexpected_block_end\0",
        Ok(MohidErrorCode::MissingKeyword) => "missing_keyword\0",
        Ok(MohidErrorCode::BadKeywordValue) => "bad_keyword_value\0",
        Ok(MohidErrorCode::BadInstant) => "bad_instant\0",
        Ok(MohidErrorCode::BadTimeWindow) => "bad_time_window\0",
        Ok(MohidErrorCode::BadTimeStep) => "bad_time_step\0",
        Ok(MohidErrorCode::DtNotSubmultiple) => "dt_not_submultiple\0",
        Ok(MohidErrorCode::EngineBusy) => "engine_busy\0",
        Ok(MohidErrorCode::NotInitialized) => "not_initialized\0",
        Ok(MohidErrorCode::AlreadyInitialized) => "already_initialized\0",
        Ok(MohidErrorCode::AlreadyFinished) => "already_finished\0",
        Ok(MohidErrorCode::BadStep) => "bad_step\0",
        Ok(MohidErrorCode::NativeFailure) => "native_failure\0",
        Ok(MohidErrorCode::Generic) => "generic\0",
        Err(()) => "unknown_error\0",
    };
    s.as_ptr() as *const c_char
}

/// # Safety
///
/// The pointer must have been created by a mohid function that returns a `*mut MohidError`,
/// must not be null, and must not have been freed already.
#[no_mangle]
pub unsafe extern "C" fn mohid_error_free(err: *mut MohidError) {
    if err.is_null() {
        return;
    }
    let _ = MohidError::from_raw(err);
}

/// # Safety
///
/// The pointer must be either null or a valid `MohidError` pointer that has not been freed.
#[no_mangle]
pub unsafe extern "C" fn mohid_error_get_code(err: *const MohidError) -> MohidErrorCode {
    if err.is_null() {
        return MohidErrorCode::Generic;
    }
    (*err).code()
}

/// # Safety
///
/// The pointer must be either null or a valid `MohidError` pointer that has not been freed.
#[no_mangle]
pub unsafe extern "C" fn mohid_error_get_kind(err: *const MohidError) -> MohidErrorKind {
    if err.is_null() {
        return MohidErrorKind::Misuse;
    }
    (*err).kind()
}

/// # Safety
///
/// The pointer must be either null or a valid `MohidError` pointer that has not been freed.
/// The returned string pointer is valid only as long as the error object is not freed.
#[no_mangle]
pub unsafe extern "C" fn mohid_error_get_message(err: *const MohidError) -> *const c_char {
    if err.is_null() {
        return ptr::null();
    }
    (*err).message_ptr()
}

/// # Safety
///
/// The pointer must be either null or a valid `MohidError` pointer that has not been freed.
#[no_mangle]
pub unsafe extern "C" fn mohid_error_get_detail_count(err: *const MohidError) -> usize {
    if err.is_null() {
        return 0;
    }
    (*err).detail_count()
}

/// Detail strings hold the messages the engine logged alongside the failure.
///
/// # Safety
///
/// The pointer must be either null or a valid `MohidError` pointer that has not been freed.
/// The returned string pointer is valid only as long as the error object is not freed.
#[no_mangle]
pub unsafe extern "C" fn mohid_error_get_detail(
    err: *const MohidError,
    index: usize,
) -> *const c_char {
    if err.is_null() {
        return ptr::null();
    }
    (*err).detail_at(index)
}

/// Frees a string returned by the API
///
/// # Safety
/// - `s` must be a valid pointer returned by mohid API functions that return strings
#[no_mangle]
pub unsafe extern "C" fn mohid_free_string(s: *mut c_char) {
    drop_c_string(s);
}
