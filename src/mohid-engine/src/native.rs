// Copyright 2026 The MOHID Access Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Binding to the prebuilt MOHID Land engine library.
//!
//! The library exports its OpenMI entry points under upper-case names with
//! the C calling convention. Integers are passed by reference, logical
//! results come back as a C `int`, and strings are fixed-length buffers
//! padded with blanks. MOHID keeps its model state in module globals, so
//! only one instance may be live in a process at a time.

use std::ffi::CString;
use std::os::raw::{c_char, c_double, c_int};
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use chrono::NaiveDateTime;
use lazy_static::lazy_static;
use tracing::{debug, info};

use crate::common::{Error, ErrorCode, ErrorKind, Result};
use crate::engine::Engine;
use crate::init_err;
use crate::instant::parse_instant;

const STRING_LEN: usize = 256;

#[link(name = "MohidLandEngine")]
extern "C" {
    #[link_name = "INITIALIZE"]
    fn mohid_initialize(file_path: *const c_char, length: *const c_int) -> c_int;
    #[link_name = "RUNSIMULATION"]
    fn mohid_run_simulation() -> c_int;
    #[link_name = "PERFORMTIMESTEP"]
    fn mohid_perform_time_step() -> c_int;
    #[link_name = "FINISH"]
    fn mohid_finish() -> c_int;
    #[link_name = "GETMODELID"]
    fn mohid_get_model_id(id: *mut c_char, length: *const c_int) -> c_int;
    #[link_name = "GETSTARTINSTANT"]
    fn mohid_get_start_instant(instant: *mut c_char, length: *const c_int) -> c_int;
    #[link_name = "GETSTOPINSTANT"]
    fn mohid_get_stop_instant(instant: *mut c_char, length: *const c_int) -> c_int;
    #[link_name = "GETCURRENTINSTANT"]
    fn mohid_get_current_instant(instant: *mut c_char, length: *const c_int) -> c_int;
    #[link_name = "GETCURRENTTIMESTEP"]
    fn mohid_get_current_time_step() -> c_double;
    #[link_name = "GETNUMBEROFMESSAGES"]
    fn mohid_get_number_of_messages() -> c_int;
    #[link_name = "GETMESSAGE"]
    fn mohid_get_message(index: *const c_int, message: *mut c_char, length: *const c_int)
        -> c_int;
}

// MOHID isn't thread-safe and holds one model per process.
lazy_static! {
    static ref LIVE: Mutex<bool> = Mutex::new(false);
}

/// Proof that this process' single native slot is taken.
struct Slot;

impl Slot {
    fn claim() -> Result<Self> {
        let mut live = LIVE.lock().unwrap_or_else(PoisonError::into_inner);
        if *live {
            return init_err!(
                EngineBusy,
                "another native engine instance is live in this process".to_string()
            );
        }
        *live = true;
        Ok(Slot)
    }
}

impl Drop for Slot {
    fn drop(&mut self) {
        *LIVE.lock().unwrap_or_else(PoisonError::into_inner) = false;
    }
}

fn from_fortran(buf: &[u8]) -> String {
    let end = buf.iter().position(|b| *b == 0).unwrap_or(buf.len());
    String::from_utf8_lossy(&buf[..end]).trim_end().to_string()
}

fn read_string(
    what: &str,
    call: unsafe extern "C" fn(*mut c_char, *const c_int) -> c_int,
) -> Result<String> {
    let mut buf = vec![0u8; STRING_LEN];
    let length = STRING_LEN as c_int;
    let ok = unsafe { call(buf.as_mut_ptr() as *mut c_char, &length) };
    if ok == 0 {
        return Err(native_error(ErrorKind::Simulation, what));
    }
    Ok(from_fortran(&buf))
}

/// Drains the engine's message log into an error.
fn native_error(kind: ErrorKind, what: &str) -> Error {
    let messages = engine_messages();
    let details = if messages.is_empty() {
        format!("{what} failed")
    } else {
        format!("{what} failed: {}", messages.join("; "))
    };
    Error::new(kind, ErrorCode::NativeFailure, Some(details))
}

fn engine_messages() -> Vec<String> {
    let count = unsafe { mohid_get_number_of_messages() };
    let length = STRING_LEN as c_int;
    (1..=count)
        .filter_map(|index| {
            let mut buf = vec![0u8; STRING_LEN];
            let ok = unsafe { mohid_get_message(&index, buf.as_mut_ptr() as *mut c_char, &length) };
            (ok != 0).then(|| from_fortran(&buf))
        })
        .filter(|message| !message.is_empty())
        .collect()
}

pub struct NativeEngine {
    _slot: Slot,
}

impl NativeEngine {
    fn instant(
        &self,
        what: &str,
        call: unsafe extern "C" fn(*mut c_char, *const c_int) -> c_int,
    ) -> Result<NaiveDateTime> {
        let text = read_string(what, call)?;
        parse_instant(&text).map_err(|mut err| {
            err.kind = ErrorKind::Simulation;
            err.code = ErrorCode::NativeFailure;
            err
        })
    }
}

impl Engine for NativeEngine {
    fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return init_err!(DoesNotExist, format!("{}", path.display()));
        }
        let slot = Slot::claim()?;

        let raw = path.to_string_lossy().into_owned();
        let length = raw.len() as c_int;
        let file_path = match CString::new(raw) {
            Ok(file_path) => file_path,
            Err(_) => {
                return init_err!(BadKeywordValue, format!("{} contains NUL", path.display()));
            }
        };

        debug!(descriptor = %path.display(), "calling native INITIALIZE");
        if unsafe { mohid_initialize(file_path.as_ptr(), &length) } == 0 {
            return Err(native_error(ErrorKind::Initialization, "INITIALIZE"));
        }
        info!(descriptor = %path.display(), "native engine initialized");

        Ok(NativeEngine { _slot: slot })
    }

    fn run_simulation(&mut self) -> Result<()> {
        if unsafe { mohid_run_simulation() } == 0 {
            return Err(native_error(ErrorKind::Simulation, "RUNSIMULATION"));
        }
        Ok(())
    }

    fn perform_time_step(&mut self) -> Result<bool> {
        if self.current_instant()? >= self.stop_instant()? {
            return Ok(false);
        }
        if unsafe { mohid_perform_time_step() } == 0 {
            return Err(native_error(ErrorKind::Simulation, "PERFORMTIMESTEP"));
        }
        Ok(true)
    }

    fn finish(&mut self) -> Result<()> {
        if unsafe { mohid_finish() } == 0 {
            return Err(native_error(ErrorKind::Simulation, "FINISH"));
        }
        info!("native engine finished");
        Ok(())
    }

    fn model_id(&self) -> Result<String> {
        read_string("GETMODELID", mohid_get_model_id)
    }

    fn start_instant(&self) -> Result<NaiveDateTime> {
        self.instant("GETSTARTINSTANT", mohid_get_start_instant)
    }

    fn stop_instant(&self) -> Result<NaiveDateTime> {
        self.instant("GETSTOPINSTANT", mohid_get_stop_instant)
    }

    fn current_instant(&self) -> Result<NaiveDateTime> {
        self.instant("GETCURRENTINSTANT", mohid_get_current_instant)
    }

    fn current_time_step(&self) -> Result<f64> {
        Ok(unsafe { mohid_get_current_time_step() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fortran_strings_are_trimmed() {
        let mut buf = b"MOHID Land Model".to_vec();
        buf.resize(STRING_LEN, b' ');
        assert_eq!("MOHID Land Model", from_fortran(&buf));

        let mut buf = b"2002-01-01 00:00:00".to_vec();
        buf.push(0);
        buf.extend_from_slice(b"garbage");
        assert_eq!("2002-01-01 00:00:00", from_fortran(&buf));
    }

    #[test]
    fn only_one_slot_per_process() {
        let first = Slot::claim().unwrap();
        let err = Slot::claim().err().unwrap();
        assert_eq!(ErrorCode::EngineBusy, err.code);
        drop(first);
        let again = Slot::claim().unwrap();
        drop(again);
    }
}
