// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer: opens the store, loads the config, and exposes the
// portal operations as async methods.
//
// `Store` is `Send` but not `Sync`, so it is wrapped in `Arc<Mutex<>>`.  The
// lock is never held across an `.await`; every operation first sleeps for the
// configured latency, then does its synchronous work under the lock.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use docurex_bridge::{Assistant, Attachment, assistant_from_config, run_analysis};
use docurex_core::AppConfig;
use docurex_core::error::{DocurexError, Result};
use docurex_core::human_errors::humanize_error;
use docurex_core::types::{
    AuditLogEntry, DashboardStats, Document, DocumentId, LedgerEntry, Outcome, Role, Session,
    StorageLocation, UploadedFile, User, UserId, VerificationReport, VerificationStatus,
};
use docurex_ledger::{Ledger, Transaction, Wallet};
use docurex_security::access::{Permission, authorize, authorize_registration, visible_documents};
use docurex_security::audit::{AuditAction, AuditLog};
use docurex_store::Store;
use tracing::{error, info, instrument, warn};

const CONFIG_FILE: &str = "config.json";
const DATABASE_FILE: &str = "docurex.db";

/// Shared portal services.
///
/// All fields are cheaply cloneable (Arc-wrapped) so the struct can be moved
/// into tasks freely.
#[derive(Clone)]
pub struct Portal {
    store: Arc<Mutex<Store>>,
    config: Arc<Mutex<AppConfig>>,
    data_dir: Option<PathBuf>,
    assistant: Arc<dyn Assistant>,
    wallet: Wallet,
}

impl Portal {
    /// Open the portal over `data_dir`.
    ///
    /// Loads `config.json` (defaults if absent or unreadable) and opens the
    /// SQLite store next to it.
    pub fn init(data_dir: &Path) -> Result<Self> {
        info!(path = %data_dir.display(), "initialising portal");
        let config = load_config(data_dir).unwrap_or_default();
        let store = Store::open(data_dir.join(DATABASE_FILE), config.seed_default_users)?;
        Ok(Self::assemble(store, config, Some(data_dir.to_path_buf())))
    }

    /// Portal over a process-local store.  Nothing is persisted.
    pub fn in_memory(config: AppConfig) -> Result<Self> {
        let store = Store::new(
            Box::new(docurex_store::MemoryKv::new()),
            config.seed_default_users,
        )?;
        Ok(Self::assemble(store, config, None))
    }

    fn assemble(store: Store, config: AppConfig, data_dir: Option<PathBuf>) -> Self {
        let assistant: Arc<dyn Assistant> = Arc::from(assistant_from_config(&config));
        let wallet = Wallet::new(config.confirmation_latency);
        Self {
            store: Arc::new(Mutex::new(store)),
            config: Arc::new(Mutex::new(config)),
            data_dir,
            assistant,
            wallet,
        }
    }

    /// Replace the AI assistant.
    pub fn with_assistant(mut self, assistant: Arc<dyn Assistant>) -> Self {
        self.assistant = assistant;
        self
    }

    /// Simulated network delay before an operation resolves.
    async fn pause(&self) {
        let delay = self.config().latency.sample();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    fn with_store<R>(&self, f: impl FnOnce(&Store) -> Result<R>) -> Result<R> {
        let store = self.store.lock().expect("store lock poisoned");
        f(&store)
    }

    // -- Session -------------------------------------------------------------

    /// Sign in by email.  The password is accepted as given; accounts carry
    /// no credential.
    #[instrument(skip(self, _password))]
    pub async fn login(&self, email: &str, _password: &str) -> Result<Option<Session>> {
        self.pause().await;
        self.with_store(|store| {
            let wanted = email.trim();
            let Some(user) = store
                .users()
                .find(|u| u.email.eq_ignore_ascii_case(wanted))?
            else {
                info!("login failed: unknown email");
                return Ok(None);
            };
            AuditLog::new(store).record(
                &user,
                AuditAction::Login.as_str(),
                &format!("User {} logged in.", user.name),
            )?;
            store.save_session_user(&user)?;
            info!(user = %user.id, role = %user.role, "logged in");
            Ok(Some(Session::new(user)))
        })
    }

    pub async fn logout(&self) -> Result<()> {
        self.with_store(|store| store.clear_session())?;
        self.wallet.disconnect();
        info!("logged out");
        Ok(())
    }

    /// Restore the persisted session, if any.
    ///
    /// A marker naming an account that no longer exists is cleared.
    pub async fn current_session(&self) -> Result<Option<Session>> {
        self.with_store(|store| {
            let Some(user) = store.load_session_user()? else {
                return Ok(None);
            };
            match store.users().find(|u| u.id == user.id)? {
                Some(current) => Ok(Some(Session::new(current))),
                None => {
                    warn!(user = %user.id, "session refers to unknown account; clearing");
                    store.clear_session()?;
                    Ok(None)
                }
            }
        })
    }

    // -- Users ---------------------------------------------------------------

    /// Create an account on behalf of `session`.
    ///
    /// Validation failures come back as an unsuccessful [`Outcome`] with a
    /// message fit for display; a creator without the right to register
    /// `role` gets `Forbidden`.
    #[instrument(skip(self, session), fields(creator = %session.user.id))]
    pub async fn register_user(
        &self,
        session: &Session,
        name: &str,
        email: &str,
        role: Role,
    ) -> Result<Outcome> {
        self.pause().await;
        authorize_registration(&session.user, role)?;

        let name = name.trim();
        let email = email.trim();
        let missing = if name.is_empty() {
            Some("name")
        } else if email.is_empty() {
            Some("email")
        } else {
            None
        };
        if let Some(field) = missing {
            return Ok(Outcome::failed(
                humanize_error(&DocurexError::MissingField(field)).message,
            ));
        }

        self.with_store(|store| {
            let user = User::new(name, email, role);
            let inserted = store.users().update(|users| {
                if users.iter().any(|u| u.email.eq_ignore_ascii_case(email)) {
                    false
                } else {
                    users.push(user.clone());
                    true
                }
            })?;
            if !inserted {
                info!("registration refused: duplicate email");
                return Ok(Outcome::failed(
                    humanize_error(&DocurexError::DuplicateEmail(email.to_owned())).message,
                ));
            }

            AuditLog::new(store).record(
                &session.user,
                AuditAction::UserCreation.as_str(),
                &format!("Created new user '{name}' with role {role}."),
            )?;
            info!(user = %user.id, %role, "user created");
            Ok(Outcome::ok("User created successfully."))
        })
    }

    pub async fn patients(&self, session: &Session) -> Result<Vec<User>> {
        self.pause().await;
        authorize(&session.user, Permission::ListPatients)?;
        self.with_store(|store| {
            Ok(store
                .users()
                .list()?
                .into_iter()
                .filter(|u| u.role == Role::Patient)
                .collect())
        })
    }

    pub async fn all_users(&self, session: &Session) -> Result<Vec<User>> {
        self.pause().await;
        authorize(&session.user, Permission::ListUsers)?;
        self.with_store(|store| store.users().list())
    }

    // -- Documents and ledger -----------------------------------------------

    /// Documents visible to the session's user.
    pub async fn documents(&self, session: &Session) -> Result<Vec<Document>> {
        self.pause().await;
        authorize(&session.user, Permission::ViewDocuments)?;
        self.with_store(|store| Ok(visible_documents(&session.user, &store.documents().list()?)))
    }

    /// Visible documents paired with their ledger status (`None` when the
    /// entry is missing).
    pub async fn documents_with_status(
        &self,
        session: &Session,
    ) -> Result<Vec<(Document, Option<VerificationStatus>)>> {
        let docs = self.documents(session).await?;
        self.with_store(|store| {
            let ledger = Ledger::new(store);
            docs.into_iter()
                .map(|d| -> Result<_> {
                    let status = ledger.effective_status(&d)?;
                    Ok((d, status))
                })
                .collect()
        })
    }

    pub async fn ledger_entries(&self, session: &Session) -> Result<Vec<LedgerEntry>> {
        self.pause().await;
        authorize(&session.user, Permission::ViewLedger)?;
        self.with_store(|store| Ledger::new(store).entries())
    }

    /// Upload `file` for `patient_id` and record a wallet transaction for it.
    pub async fn upload_document(
        &self,
        session: &Session,
        file: &UploadedFile,
        patient_id: &UserId,
        storage_location: StorageLocation,
    ) -> Result<(Document, Transaction)> {
        self.pause().await;
        let doc = self.with_store(|store| {
            Ledger::new(store).record_upload(file, &session.user, patient_id, storage_location)
        })?;
        let tx = self.wallet.add_transaction(&format!("Uploaded: {}", doc.name));
        Ok((doc, tx))
    }

    pub async fn verify_document(&self, session: &Session, document_id: &DocumentId) -> Result<bool> {
        self.pause().await;
        self.with_store(|store| Ledger::new(store).verify(document_id, &session.user))
    }

    /// Hash `file` and look it up on the ledger.
    pub async fn check_file(
        &self,
        session: &Session,
        file: &UploadedFile,
    ) -> Result<VerificationReport> {
        self.pause().await;
        authorize(&session.user, Permission::CheckFile)?;
        self.with_store(|store| Ledger::new(store).check_file(file))
    }

    // -- Audit and dashboard -------------------------------------------------

    /// Audit entries, newest first.
    pub async fn audit_logs(&self, session: &Session) -> Result<Vec<AuditLogEntry>> {
        self.pause().await;
        authorize(&session.user, Permission::ViewAuditLog)?;
        self.with_store(|store| AuditLog::new(store).entries())
    }

    pub async fn dashboard_stats(&self, session: &Session) -> Result<DashboardStats> {
        self.pause().await;
        authorize(&session.user, Permission::ViewDashboardStats)?;
        self.with_store(|store| {
            Ok(DashboardStats {
                total_users: store.users().len()?,
                documents_stored: store.documents().len()?,
                pending_verifications: Ledger::new(store).pending_count()?,
                audit_events: AuditLog::new(store).count()?,
            })
        })
    }

    // -- AI assistant --------------------------------------------------------

    /// Ask the assistant.  Always returns text: either the answer or a
    /// message explaining why there is none.
    pub async fn ask_assistant(
        &self,
        session: &Session,
        prompt: &str,
        attachment: Option<Attachment>,
    ) -> String {
        if let Err(e) = authorize(&session.user, Permission::UseAssistant) {
            return humanize_error(&e).message;
        }
        let assistant = Arc::clone(&self.assistant);
        let prompt = prompt.to_owned();
        let joined = tokio::task::spawn_blocking(move || {
            run_analysis(assistant.as_ref(), &prompt, attachment.as_ref())
        })
        .await;
        match joined {
            Ok(text) => text,
            Err(e) => {
                error!(error = %e, "assistant task failed");
                humanize_error(&DocurexError::Assistant(e.to_string())).message
            }
        }
    }

    // -- Wallet and config ---------------------------------------------------

    pub fn wallet(&self) -> &Wallet {
        &self.wallet
    }

    pub fn config(&self) -> AppConfig {
        self.config.lock().expect("config lock poisoned").clone()
    }

    /// Update the config and persist it when the portal has a data directory.
    pub fn save_config(&self, config: &AppConfig) -> Result<()> {
        *self.config.lock().expect("config lock poisoned") = config.clone();
        match &self.data_dir {
            Some(dir) => persist_config(dir, config),
            None => Ok(()),
        }
    }
}

fn load_config(data_dir: &Path) -> Option<AppConfig> {
    let path = data_dir.join(CONFIG_FILE);
    let data = std::fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&data) {
        Ok(config) => Some(config),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring unreadable config");
            None
        }
    }
}

fn persist_config(data_dir: &Path, config: &AppConfig) -> Result<()> {
    let path = data_dir.join(CONFIG_FILE);
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(&path, json)?;
    Ok(())
}
