// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! docurex-security: integrity and accountability primitives for the portal.
//!
//! Content addressing of uploaded files, the append-only audit trail, and
//! the table-driven role policy that is the portal's only authorization
//! boundary.

pub mod access;
pub mod audit;
pub mod integrity;

// PUBLIC API: Re-export the primitives the ledger and service layer use
pub use access::{Permission, Route, authorize, visible_documents};
pub use audit::{AuditAction, AuditLog};
pub use integrity::{hash_bytes, hash_upload, verify_hash};
