// Copyright 2026 The MOHID Access Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use tracing::info;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const LOG_ENV: &str = "MOHID_LOG";
const DEFAULT_DIRECTIVE: &str = "info";

fn filter(directive: &str) -> EnvFilter {
    EnvFilter::try_new(directive).unwrap_or_else(|err| {
        eprintln!("invalid {LOG_ENV} directive ({err}); defaulting to {DEFAULT_DIRECTIVE}");
        EnvFilter::new(DEFAULT_DIRECTIVE)
    })
}

/// Installs a stderr subscriber filtered by `MOHID_LOG` (`info` when
/// unset). Returns false when a global subscriber was already installed,
/// by an earlier call or by the host.
pub fn init() -> bool {
    let directive = std::env::var(LOG_ENV).unwrap_or_else(|_| DEFAULT_DIRECTIVE.to_string());
    let installed = tracing_subscriber::registry()
        .with(filter(&directive))
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()
        .is_ok();
    if installed {
        info!(filter = %directive, "logging initialized");
    }
    installed
}

/// Installs the library's log subscriber. Safe to call more than once.
#[no_mangle]
pub extern "C" fn mohid_init_logging() -> bool {
    init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_a_no_op() {
        init();
        assert!(!init());
        assert!(!mohid_init_logging());
    }
}
