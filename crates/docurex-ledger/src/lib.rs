// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Docu-Rex Ledger: the append-only document ledger, the upload flow that
// creates a document and its ledger entry together, admin verification, and
// the simulated wallet that tracks ledger transactions.  This crate sits on
// top of the store and security crates and is driven by the app's service
// layer.

pub mod ledger;
pub mod wallet;

pub use ledger::Ledger;
pub use wallet::{Transaction, TransactionStatus, Wallet};
