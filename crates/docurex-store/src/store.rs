// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The portal's persistent store: four record collections and the session
// marker, all living in one key-value backend.

use std::path::Path;

use docurex_core::error::Result;
use docurex_core::types::{AuditLogEntry, Document, LedgerEntry, Role, User, UserId};
use tracing::{info, instrument, warn};

use crate::collection::Collection;
use crate::kv::{KvBackend, MemoryKv, SqliteKv};

pub const USERS_KEY: &str = "docurex_users";
pub const DOCUMENTS_KEY: &str = "docurex_documents";
pub const LEDGER_KEY: &str = "docurex_blockchain";
pub const AUDIT_KEY: &str = "docurex_auditlogs";
pub const SESSION_KEY: &str = "docu-rex-user";

/// The three demo accounts written on first start.
pub fn default_users() -> Vec<User> {
    vec![
        User {
            id: UserId::from("1"),
            name: "Dr. Alice".into(),
            email: "alice@docurex.com".into(),
            role: Role::Doctor,
        },
        User {
            id: UserId::from("2"),
            name: "Bob Patient".into(),
            email: "bob@docurex.com".into(),
            role: Role::Patient,
        },
        User {
            id: UserId::from("3"),
            name: "Charlie Admin".into(),
            email: "charlie@docurex.com".into(),
            role: Role::Admin,
        },
    ]
}

/// Owner of every persisted collection.
///
/// `Store` is `Send` but not `Sync`; share it behind a `Mutex`.
pub struct Store {
    backend: Box<dyn KvBackend>,
    seed_users: bool,
}

impl Store {
    /// Wrap `backend`, seeding any collection that is missing or corrupt.
    pub fn new(backend: Box<dyn KvBackend>, seed_default_users: bool) -> Result<Self> {
        let store = Self {
            backend,
            seed_users: seed_default_users,
        };
        store.users().initialize()?;
        store.documents().initialize()?;
        store.ledger().initialize()?;
        store.audit_logs().initialize()?;
        Ok(store)
    }

    /// Open (or create) a SQLite-backed store at `path`.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>, seed_default_users: bool) -> Result<Self> {
        let store = Self::new(Box::new(SqliteKv::open(path)?), seed_default_users)?;
        info!("store ready");
        Ok(store)
    }

    /// Process-local store (useful for tests and as a fallback).
    pub fn open_in_memory() -> Result<Self> {
        Self::new(Box::new(MemoryKv::new()), true)
    }

    pub fn users(&self) -> Collection<'_, User> {
        let seed: fn() -> Vec<User> = if self.seed_users {
            default_users
        } else {
            Vec::new
        };
        Collection::new(self.backend.as_ref(), USERS_KEY, seed)
    }

    pub fn documents(&self) -> Collection<'_, Document> {
        Collection::new(self.backend.as_ref(), DOCUMENTS_KEY, Vec::new)
    }

    pub fn ledger(&self) -> Collection<'_, LedgerEntry> {
        Collection::new(self.backend.as_ref(), LEDGER_KEY, Vec::new)
    }

    /// Newest entry first.
    pub fn audit_logs(&self) -> Collection<'_, AuditLogEntry> {
        Collection::new(self.backend.as_ref(), AUDIT_KEY, Vec::new)
    }

    // -- Session marker ------------------------------------------------------

    /// Persist the signed-in user.
    pub fn save_session_user(&self, user: &User) -> Result<()> {
        self.backend.set(SESSION_KEY, &serde_json::to_string(user)?)
    }

    /// The signed-in user, if any.  A marker that no longer parses is removed.
    pub fn load_session_user(&self) -> Result<Option<User>> {
        let Some(raw) = self.backend.get(SESSION_KEY)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                warn!(error = %e, "discarding unparseable session marker");
                self.backend.remove(SESSION_KEY)?;
                Ok(None)
            }
        }
    }

    pub fn clear_session(&self) -> Result<()> {
        self.backend.remove(SESSION_KEY)
    }
}
