// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Audit trail: append-only, newest-first record of every security-relevant
// action (login, account creation, upload, verification).
//
// Entries are inserted at the head of the `docurex_auditlogs` collection and
// persisted in the same call.  There is no deduplication and no size cap.

use chrono::Utc;
use docurex_core::error::Result;
use docurex_core::types::{AuditLogEntry, User, UserId};
use docurex_store::Store;
use tracing::{debug, instrument};
use uuid::Uuid;

/// The actions the portal records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    Login,
    UserCreation,
    DocumentUpload,
    DocumentVerification,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Login => "Login",
            Self::UserCreation => "User Creation",
            Self::DocumentUpload => "Document Upload",
            Self::DocumentVerification => "Document Verification",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audit log view over a [`Store`].
pub struct AuditLog<'a> {
    store: &'a Store,
}

impl<'a> AuditLog<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Record a new audit entry at the head of the log.
    #[instrument(skip(self, actor, details), fields(%action, user = %actor.id))]
    pub fn record(&self, actor: &User, action: &str, details: &str) -> Result<AuditLogEntry> {
        let entry = AuditLogEntry {
            id: Uuid::new_v4().to_string(),
            action: action.to_owned(),
            user_id: actor.id.clone(),
            user_name: actor.name.clone(),
            user_role: actor.role,
            timestamp: Utc::now(),
            details: details.to_owned(),
        };

        self.store.audit_logs().prepend(entry.clone())?;

        debug!("audit entry recorded");
        Ok(entry)
    }

    /// Every entry, newest first.
    pub fn entries(&self) -> Result<Vec<AuditLogEntry>> {
        self.store.audit_logs().list()
    }

    /// The most recent `limit` entries, newest first.
    pub fn recent_entries(&self, limit: usize) -> Result<Vec<AuditLogEntry>> {
        let mut entries = self.entries()?;
        entries.truncate(limit);
        Ok(entries)
    }

    /// Entries recorded for one actor, newest first.
    pub fn entries_for_user(&self, user_id: &UserId) -> Result<Vec<AuditLogEntry>> {
        Ok(self
            .entries()?
            .into_iter()
            .filter(|e| &e.user_id == user_id)
            .collect())
    }

    /// Return the total number of entries in the audit log.
    pub fn count(&self) -> Result<usize> {
        self.store.audit_logs().len()
    }
}
