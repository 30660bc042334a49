// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tracing subscriber setup for tests.

use tracing_subscriber::EnvFilter;

/// Install a test-writer subscriber once per process.
///
/// `RUST_LOG` wins when set; otherwise the Mnemo crates log at debug and
/// everything else at warn. Repeated calls are no-ops.
pub fn init_test_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("mnemo_memory=debug,mnemo_storage=debug,mnemo_config=debug,warn")
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_test_writer()
        .try_init();
}
