// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded database migrations using refinery.
//!
//! The `migrations/` directory is compiled into the crate and applied on
//! every open; refinery records what has already run in
//! `refinery_schema_history`.

use mnemo_core::MnemoError;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Apply all pending migrations to the given connection.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), MnemoError> {
    let report = embedded::migrations::runner()
        .run(conn)
        .map_err(|e| MnemoError::storage("run migrations", e))?;
    for migration in report.applied_migrations() {
        tracing::debug!(version = migration.version(), name = migration.name(), "applied migration");
    }
    Ok(())
}
