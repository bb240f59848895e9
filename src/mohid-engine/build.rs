// Copyright 2026 The MOHID Access Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::env;

fn main() {
    println!("cargo:rerun-if-env-changed=MOHID_LIB_DIR");

    // the clock engine is pure Rust, only the native binding links anything
    if env::var_os("CARGO_FEATURE_NATIVE").is_none() {
        return;
    }

    if let Some(dir) = env::var_os("MOHID_LIB_DIR") {
        println!("cargo:rustc-link-search=native={}", dir.to_string_lossy());
    } else {
        println!("cargo:warning=MOHID_LIB_DIR is not set, relying on the system library path");
    }
}
