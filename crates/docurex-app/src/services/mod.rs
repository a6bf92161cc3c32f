// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Service layer: bridges the command line to the docurex backend crates.
//
// The portal wraps the store, ledger, audit log, access policy, wallet, and
// assistant behind async methods that take the caller's session explicitly.

pub mod data_dir;
pub mod portal;
