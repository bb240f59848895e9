// Copyright 2026 The MOHID Access Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::ffi::CString;
use std::os::raw::c_char;
use std::ptr;

use crate::{MohidErrorCode, MohidErrorKind};

/// Transcode strings for FFI consumption by stripping interior NUL bytes.
pub(crate) fn sanitize_for_c(value: String) -> CString {
    match CString::new(value) {
        Ok(cstring) => cstring,
        Err(err) => {
            let mut bytes = err.into_vec();
            bytes.retain(|b| *b != 0);
            // no NUL bytes remain, so this cannot fail
            CString::new(bytes).unwrap_or_default()
        }
    }
}

/// Rich error object passed across the FFI boundary.
pub struct MohidError {
    code: MohidErrorCode,
    kind: MohidErrorKind,
    message: Option<CString>,
    details: Vec<CString>,
}

impl MohidError {
    pub fn new(code: MohidErrorCode) -> Self {
        Self {
            code,
            kind: MohidErrorKind::from(code),
            message: None,
            details: Vec::new(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.set_message(Some(message.into()));
        self
    }

    pub fn set_message(&mut self, message: Option<String>) {
        self.message = message.map(sanitize_for_c);
    }

    pub fn set_kind(&mut self, kind: MohidErrorKind) {
        self.kind = kind;
    }

    pub fn extend_details<I>(&mut self, details: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.details
            .extend(details.into_iter().map(sanitize_for_c));
    }

    pub fn code(&self) -> MohidErrorCode {
        self.code
    }

    pub fn kind(&self) -> MohidErrorKind {
        self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_ref().and_then(|msg| msg.to_str().ok())
    }

    pub fn message_ptr(&self) -> *const c_char {
        self.message
            .as_ref()
            .map_or(ptr::null(), |msg| msg.as_ptr() as *const c_char)
    }

    pub fn detail_count(&self) -> usize {
        self.details.len()
    }

    pub fn detail_at(&self, index: usize) -> *const c_char {
        self.details
            .get(index)
            .map_or(ptr::null(), |detail| detail.as_ptr() as *const c_char)
    }

    pub fn into_raw(self) -> *mut Self {
        Box::into_raw(Box::new(self))
    }

    /// # Safety
    ///
    /// The pointer must have been created via `into_raw` and must not have been freed already.
    /// After calling this function, the pointer is invalid and must not be used again.
    pub unsafe fn from_raw(ptr: *mut Self) -> Box<Self> {
        Box::from_raw(ptr)
    }
}

/// Wrapper error type that can be embedded inside anyhow chains.
#[derive(Debug, Clone)]
pub struct FfiError {
    pub code: MohidErrorCode,
    pub kind: Option<MohidErrorKind>,
    pub message: Option<String>,
    pub details: Vec<String>,
}

impl FfiError {
    pub fn new(code: MohidErrorCode) -> Self {
        Self {
            code,
            kind: None,
            message: None,
            details: Vec::new(),
        }
    }

    pub fn with_kind(mut self, kind: MohidErrorKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.details.push(detail.into());
        self
    }

    pub fn into_mohid_error(self) -> MohidError {
        let mut error = MohidError::new(self.code);
        if let Some(kind) = self.kind {
            error.set_kind(kind);
        }
        error.set_message(self.message);
        error.extend_details(self.details);
        error
    }
}

impl Default for FfiError {
    fn default() -> Self {
        Self::new(MohidErrorCode::Generic)
    }
}

impl std::fmt::Display for FfiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(message) = &self.message {
            write!(f, "{message}")
        } else {
            write!(f, "{:?}", self.code)
        }
    }
}

impl std::error::Error for FfiError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;

    #[test]
    fn interior_nul_bytes_are_stripped() {
        let s = sanitize_for_c("MOHID\0Land".to_string());
        assert_eq!("MOHIDLand", s.to_str().unwrap());
    }

    #[test]
    fn ffi_error_keeps_details_in_order() {
        let error = FfiError::new(MohidErrorCode::NativeFailure)
            .with_message("PERFORMTIMESTEP failed")
            .with_detail("Courant number exceeded")
            .with_detail("negative water column")
            .into_mohid_error();

        assert_eq!(MohidErrorCode::NativeFailure, error.code());
        assert_eq!(Some("PERFORMTIMESTEP failed"), error.message());
        assert_eq!(2, error.detail_count());
        let second = unsafe { CStr::from_ptr(error.detail_at(1)) };
        assert_eq!("negative water column", second.to_str().unwrap());
        assert!(error.detail_at(2).is_null());
    }

    #[test]
    fn explicit_kind_overrides_the_default() {
        let error = FfiError::new(MohidErrorCode::NativeFailure).into_mohid_error();
        assert_eq!(MohidErrorKind::Simulation, error.kind());

        let error = FfiError::new(MohidErrorCode::NativeFailure)
            .with_kind(MohidErrorKind::Initialization)
            .into_mohid_error();
        assert_eq!(MohidErrorKind::Initialization, error.kind());
    }
}
