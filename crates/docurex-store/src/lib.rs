// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Docu-Rex Store: durable key → JSON-array persistence for the four record
// collections (users, documents, ledger entries, audit logs) plus the
// session marker.  Backends are swappable: SQLite on disk for real runs, a
// plain map in memory for tests.

pub mod collection;
pub mod kv;
pub mod store;

pub use collection::Collection;
pub use kv::{KvBackend, MemoryKv, SqliteKv};
pub use store::{default_users, Store};
