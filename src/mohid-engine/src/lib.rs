// Copyright 2026 The MOHID Access Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Lifecycle access to the MOHID Land simulation engine.
//!
//! A project is loaded from its descriptor file into an [`EngineHandle`],
//! run to completion (or stepped), queried for its identity and time
//! window, and finished. The engine behind the handle is any [`Engine`]:
//! the in-process [`ClockEngine`] by default, or the native MOHID Land
//! library with the `native` feature.
//!
//! The integration tests build their projects with `test_common`, which is
//! behind the `testing` feature: run them with
//! `cargo test -p mohid-engine --features testing`.

#![cfg_attr(not(feature = "native"), forbid(unsafe_code))]

pub mod common;
mod clock;
mod descriptor;
mod engine;
mod handle;
pub mod instant;
#[cfg(feature = "native")]
mod native;
#[cfg(any(test, feature = "testing"))]
pub mod test_common;
mod window;

pub use self::clock::ClockEngine;
pub use self::common::{Error, ErrorCode, ErrorKind, Result};
pub use self::descriptor::Descriptor;
pub use self::engine::{Engine, MODEL_ID};
pub use self::handle::EngineHandle;
#[cfg(feature = "native")]
pub use self::native::NativeEngine;
pub use self::window::TimeWindow;

pub use chrono;

/// The engine a plain `EngineHandle` drives.
#[cfg(not(feature = "native"))]
pub type DefaultEngine = ClockEngine;
#[cfg(feature = "native")]
pub type DefaultEngine = NativeEngine;
