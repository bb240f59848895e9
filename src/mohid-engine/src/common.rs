// Copyright 2026 The MOHID Access Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::{error, fmt, result};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    DoesNotExist,
    Io,
    UnterminatedBlock,
    UnexpectedBlockEnd,
    MissingKeyword,
    BadKeywordValue,
    BadInstant,
    BadTimeWindow,
    BadTimeStep,
    DtNotSubmultiple,
    EngineBusy,
    NotInitialized,
    AlreadyInitialized,
    AlreadyFinished,
    BadStep,
    NativeFailure,
    Generic,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use ErrorCode::*;
        let name = match self {
            DoesNotExist => "does_not_exist",
            Io => "io",
            UnterminatedBlock => "unterminated_block",
            UnexpectedBlockEnd => "unexpected_block_end",
            MissingKeyword => "missing_keyword",
            BadKeywordValue => "bad_keyword_value",
            BadInstant => "bad_instant",
            BadTimeWindow => "bad_time_window",
            BadTimeStep => "bad_time_step",
            DtNotSubmultiple => "dt_not_submultiple",
            EngineBusy => "engine_busy",
            NotInitialized => "not_initialized",
            AlreadyInitialized => "already_initialized",
            AlreadyFinished => "already_finished",
            BadStep => "bad_step",
            NativeFailure => "native_failure",
            Generic => "generic",
        };

        write!(f, "{name}")
    }
}

/// Which phase of the engine lifecycle an error belongs to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The project descriptor could not be loaded or the engine rejected it.
    Initialization,
    /// A lifecycle operation was called out of order.
    Misuse,
    /// The engine failed while stepping.
    Simulation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    pub kind: ErrorKind,
    pub code: ErrorCode,
    pub details: Option<String>,
}

impl Error {
    pub fn new(kind: ErrorKind, code: ErrorCode, details: Option<String>) -> Self {
        Error {
            kind,
            code,
            details,
        }
    }

    pub fn get_details(&self) -> Option<String> {
        self.details.clone()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let kind = match self.kind {
            ErrorKind::Initialization => "InitializationError",
            ErrorKind::Misuse => "MisuseError",
            ErrorKind::Simulation => "SimulationError",
        };
        match self.details {
            Some(ref details) => write!(f, "{}{{{}: {}}}", kind, self.code, details),
            None => write!(f, "{}{{{}}}", kind, self.code),
        }
    }
}

impl error::Error for Error {}

pub type Result<T> = result::Result<T, Error>;

#[macro_export]
macro_rules! init_err {
    ($code:tt, $str:expr) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error::new(
            ErrorKind::Initialization,
            ErrorCode::$code,
            Some($str),
        ))
    }};
    ($code:tt) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error::new(ErrorKind::Initialization, ErrorCode::$code, None))
    }};
}

#[macro_export]
macro_rules! misuse_err {
    ($code:tt, $str:expr) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error::new(ErrorKind::Misuse, ErrorCode::$code, Some($str)))
    }};
    ($code:tt) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error::new(ErrorKind::Misuse, ErrorCode::$code, None))
    }};
}

#[macro_export]
macro_rules! sim_err {
    ($code:tt, $str:expr) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error::new(
            ErrorKind::Simulation,
            ErrorCode::$code,
            Some($str),
        ))
    }};
    ($code:tt) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error::new(ErrorKind::Simulation, ErrorCode::$code, None))
    }};
}

#[test]
fn test_error_display() {
    let err = Error::new(
        ErrorKind::Initialization,
        ErrorCode::MissingKeyword,
        Some("START".to_string()),
    );
    assert_eq!("InitializationError{missing_keyword: START}", err.to_string());

    let err = Error::new(ErrorKind::Misuse, ErrorCode::NotInitialized, None);
    assert_eq!("MisuseError{not_initialized}", err.to_string());
}

#[test]
fn test_error_macros() {
    let result: Result<()> = sim_err!(BadStep, "dt is NaN".to_string());
    let err = result.unwrap_err();
    assert_eq!(ErrorKind::Simulation, err.kind);
    assert_eq!(ErrorCode::BadStep, err.code);
    assert_eq!(Some("dt is NaN".to_string()), err.get_details());

    let result: Result<()> = misuse_err!(AlreadyFinished);
    let err = result.unwrap_err();
    assert_eq!(ErrorKind::Misuse, err.kind);
    assert!(err.details.is_none());
}
