// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite plumbing for the Mnemo memory engine.
//!
//! Opens the database with WAL journaling and embedded migrations, and hands
//! out the single-writer `tokio-rusqlite` connection that every query goes
//! through.

pub mod database;
pub mod migrations;

pub use database::{Database, map_tr_err};
