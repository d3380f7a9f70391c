// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Log output for tests.

use tracing_subscriber::EnvFilter;

/// Install a `fmt` subscriber writing through the test harness.
///
/// The filter comes from `RUST_LOG` and defaults to `info`. Safe to call from
/// every test; only the first call installs anything.
pub fn init() {
	let _ = tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.with_test_writer()
		.try_init();
}
