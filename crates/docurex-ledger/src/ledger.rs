// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document ledger and verification engine.
//
// Each upload appends one `Pending` entry carrying the document's content
// hash.  An admin may later move that entry to `Verified`; nothing ever
// moves it back, and entries are never removed.  Anyone holding a file can
// check whether its hash was ever recorded.
//
// Entries carry a `document_id` back-reference so that two uploads with the
// same content (and therefore the same hash) stay distinguishable.  Entries
// without one predate the field and are matched by hash alone.

use chrono::{DateTime, Utc};
use docurex_core::error::{DocurexError, Result};
use docurex_core::types::{
    Document, DocumentId, LedgerEntry, Role, StorageLocation, UploadedFile, User, UserId,
    VerificationReport, VerificationStatus,
};
use docurex_security::access::{Permission, authorize};
use docurex_security::audit::{AuditAction, AuditLog};
use docurex_security::integrity::hash_upload;
use docurex_store::Store;
use tracing::{debug, error, info, instrument, warn};

/// What `verify` found when it looked at the ledger.
enum Transition {
    Missing,
    AlreadyVerified,
    Verified,
}

/// Whether `entry` records `doc`.
fn belongs_to(entry: &LedgerEntry, doc: &Document) -> bool {
    match &entry.document_id {
        Some(id) => id == &doc.id,
        None => entry.document_hash == doc.hash,
    }
}

/// Ledger operations over a [`Store`].
pub struct Ledger<'a> {
    store: &'a Store,
}

impl<'a> Ledger<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Append a `Pending` entry for `document_hash`.
    #[instrument(skip(self, timestamp), fields(hash = %document_hash))]
    pub fn append_entry(
        &self,
        document_hash: &str,
        uploader_name: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<LedgerEntry> {
        let entry = LedgerEntry::new(document_hash, uploader_name, timestamp);
        self.store.ledger().append(entry.clone())?;
        debug!("ledger entry appended");
        Ok(entry)
    }

    /// Every entry in append order.
    pub fn entries(&self) -> Result<Vec<LedgerEntry>> {
        self.store.ledger().list()
    }

    /// First entry recorded for `document_hash`.
    pub fn find_by_hash(&self, document_hash: &str) -> Result<Option<LedgerEntry>> {
        self.store
            .ledger()
            .find(|e| e.document_hash == document_hash)
    }

    /// Look up a freshly computed file hash.
    pub fn verify_file_against_ledger(&self, file_hash: &str) -> Result<VerificationReport> {
        let report = VerificationReport::from_entry(self.find_by_hash(file_hash)?);
        debug!(hash = %file_hash, success = report.success, "file checked against ledger");
        Ok(report)
    }

    /// Hash `file` the way uploads are hashed and look it up.
    pub fn check_file(&self, file: &UploadedFile) -> Result<VerificationReport> {
        let hash = hash_upload(&file.name, file.size(), &file.bytes);
        self.verify_file_against_ledger(&hash)
    }

    /// The entry created for `doc`, if the ledger has one.
    pub fn entry_for_document(&self, doc: &Document) -> Result<Option<LedgerEntry>> {
        self.store.ledger().find(|e| belongs_to(e, doc))
    }

    /// Derived status of `doc`; `None` when its ledger entry is missing.
    pub fn effective_status(&self, doc: &Document) -> Result<Option<VerificationStatus>> {
        Ok(self
            .entry_for_document(doc)?
            .map(|e| e.verification_status))
    }

    /// Entries still awaiting admin verification.
    pub fn pending_count(&self) -> Result<usize> {
        Ok(self
            .entries()?
            .iter()
            .filter(|e| e.verification_status == VerificationStatus::Pending)
            .count())
    }

    /// Store an upload: the document record, its `Pending` ledger entry, and
    /// a "Document Upload" audit entry.
    ///
    /// If the ledger or audit write fails, the records already written are
    /// withdrawn again, so an upload is either stored whole or not at all.
    #[instrument(skip(self, file, uploader), fields(name = %file.name, uploader = %uploader.id))]
    pub fn record_upload(
        &self,
        file: &UploadedFile,
        uploader: &User,
        patient_id: &UserId,
        storage_location: StorageLocation,
    ) -> Result<Document> {
        authorize(uploader, Permission::UploadDocument)?;

        if file.name.trim().is_empty() {
            return Err(DocurexError::MissingField("file"));
        }
        if patient_id.0.trim().is_empty() {
            return Err(DocurexError::MissingField("patient"));
        }
        let is_patient = self
            .store
            .users()
            .find(|u| &u.id == patient_id)?
            .is_some_and(|u| u.role == Role::Patient);
        if !is_patient {
            return Err(DocurexError::InvalidPatient(patient_id.to_string()));
        }

        let hash = hash_upload(&file.name, file.size(), &file.bytes);
        let now = Utc::now();

        let document = Document {
            id: DocumentId::new(),
            name: file.name.clone(),
            mime_type: file.mime_type.clone(),
            size: file.size(),
            upload_date: now,
            uploader_id: uploader.id.clone(),
            patient_id: patient_id.clone(),
            hash: hash.clone(),
            storage_location,
        };
        let entry = LedgerEntry::new(&hash, &uploader.name, now).for_document(document.id.clone());

        self.store.documents().append(document.clone())?;
        if let Err(e) = self.store.ledger().append(entry) {
            error!(error = %e, document = %document.id, "ledger append failed; withdrawing document");
            self.withdraw_upload(&document.id)?;
            return Err(e);
        }

        let recorded = AuditLog::new(self.store).record(
            uploader,
            AuditAction::DocumentUpload.as_str(),
            &format!(
                "Uploaded '{}' for patient ID {} to {}. Hash: {}...",
                document.name,
                patient_id,
                storage_location,
                &hash[..8]
            ),
        );
        if let Err(e) = recorded {
            error!(error = %e, document = %document.id, "audit write failed; withdrawing upload");
            self.withdraw_upload(&document.id)?;
            return Err(e);
        }

        info!(document = %document.id, hash = %hash, "document uploaded");
        Ok(document)
    }

    /// Mark the ledger entry of `document_id` as `Verified`.
    ///
    /// Returns `false` when the document or its entry cannot be found.
    /// Verifying an already verified document returns `true` and records
    /// nothing. If the audit write fails the entry goes back to `Pending`.
    #[instrument(skip(self, admin), fields(document = %document_id, admin = %admin.id))]
    pub fn verify(&self, document_id: &DocumentId, admin: &User) -> Result<bool> {
        authorize(admin, Permission::VerifyDocument)?;

        let Some(doc) = self.store.documents().find(|d| &d.id == document_id)? else {
            info!("verification failed: document not found");
            return Ok(false);
        };

        let transition = self.store.ledger().update(|entries| {
            match entries.iter_mut().find(|e| belongs_to(e, &doc)) {
                None => Transition::Missing,
                Some(e) if e.is_verified() => Transition::AlreadyVerified,
                Some(e) => {
                    e.verification_status = VerificationStatus::Verified;
                    Transition::Verified
                }
            }
        })?;

        match transition {
            Transition::Missing => {
                warn!(hash = %doc.hash, "verification failed: no ledger entry for document");
                Ok(false)
            }
            Transition::AlreadyVerified => {
                debug!("document already verified");
                Ok(true)
            }
            Transition::Verified => {
                let recorded = AuditLog::new(self.store).record(
                    admin,
                    AuditAction::DocumentVerification.as_str(),
                    &format!("Admin {} verified document '{}'.", admin.name, doc.name),
                );
                if let Err(e) = recorded {
                    error!(error = %e, "audit write failed; reverting verification");
                    self.store.ledger().update(|entries| {
                        if let Some(e) = entries.iter_mut().find(|e| belongs_to(e, &doc)) {
                            e.verification_status = VerificationStatus::Pending;
                        }
                    })?;
                    return Err(e);
                }
                info!("document verified");
                Ok(true)
            }
        }
    }

    /// Remove the document record and any ledger entry created for it.
    /// Only used to undo an upload that did not complete.
    fn withdraw_upload(&self, document_id: &DocumentId) -> Result<()> {
        self.store
            .ledger()
            .update(|entries| entries.retain(|e| e.document_id.as_ref() != Some(document_id)))?;
        self.store
            .documents()
            .update(|docs| docs.retain(|d| &d.id != document_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use docurex_store::store::{AUDIT_KEY, LEDGER_KEY};
    use docurex_store::{KvBackend, MemoryKv, default_users};

    /// In-memory backend whose writes to one key fail while `failing` is set.
    struct FlakyKv {
        inner: MemoryKv,
        key: &'static str,
        failing: Arc<AtomicBool>,
    }

    impl KvBackend for FlakyKv {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<()> {
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<()> {
            self.inner.remove(key)
        }

        fn modify(
            &self,
            key: &str,
            f: &mut dyn FnMut(Option<String>) -> Result<String>,
        ) -> Result<()> {
            if key == self.key && self.failing.load(Ordering::SeqCst) {
                return Err(DocurexError::Database(format!("{key}: disk full")));
            }
            self.inner.modify(key, f)
        }
    }

    /// A fixture whose writes to `key` fail until the returned flag is cleared.
    fn flaky_fixture(key: &'static str) -> (Fixture, Arc<AtomicBool>) {
        let failing = Arc::new(AtomicBool::new(false));
        let backend = FlakyKv {
            inner: MemoryKv::new(),
            key,
            failing: Arc::clone(&failing),
        };
        let store = Store::new(Box::new(backend), true).expect("open flaky store");
        (fixture_on(store), failing)
    }

    struct Fixture {
        store: Store,
        doctor: User,
        admin: User,
        patient: User,
    }

    fn fixture() -> Fixture {
        fixture_on(Store::open_in_memory().expect("open in-memory store"))
    }

    fn fixture_on(store: Store) -> Fixture {
        let patient = User {
            id: UserId::from("p1"),
            name: "Pat One".into(),
            email: "p1@docurex.com".into(),
            role: Role::Patient,
        };
        store.users().append(patient.clone()).unwrap();
        let users = default_users();
        Fixture {
            store,
            doctor: users[0].clone(),
            admin: users[2].clone(),
            patient,
        }
    }

    fn report() -> UploadedFile {
        let mut bytes = vec![b' '; 500];
        bytes[0] = b'X';
        UploadedFile::new("report.pdf", "application/pdf", bytes)
    }

    #[test]
    fn upload_creates_document_pending_entry_and_audit() {
        let f = fixture();
        let ledger = Ledger::new(&f.store);

        let doc = ledger
            .record_upload(&report(), &f.doctor, &f.patient.id, StorageLocation::Cloud)
            .expect("upload");

        assert_eq!(doc.storage_location, StorageLocation::Cloud);
        assert_eq!(doc.size, 500);
        assert_eq!(doc.hash, hash_upload("report.pdf", 500, &report().bytes));

        let matching: Vec<_> = ledger
            .entries()
            .unwrap()
            .into_iter()
            .filter(|e| e.document_hash == doc.hash)
            .collect();
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].verification_status, VerificationStatus::Pending);
        assert_eq!(matching[0].uploader, "Dr. Alice");
        assert_eq!(matching[0].document_id.as_ref(), Some(&doc.id));

        let audit = AuditLog::new(&f.store).entries().unwrap();
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].action, "Document Upload");
        assert!(audit[0].details.contains("to Cloud"));
    }

    #[test]
    fn verify_flips_status_once_and_logs_once() {
        let f = fixture();
        let ledger = Ledger::new(&f.store);
        let doc = ledger
            .record_upload(&report(), &f.doctor, &f.patient.id, StorageLocation::Cloud)
            .unwrap();

        assert!(ledger.verify(&doc.id, &f.admin).unwrap());
        assert_eq!(
            ledger.effective_status(&doc).unwrap(),
            Some(VerificationStatus::Verified)
        );
        let audit = AuditLog::new(&f.store);
        assert_eq!(audit.count().unwrap(), 2);
        assert_eq!(audit.entries().unwrap()[0].action, "Document Verification");

        // Second call: still verified, no new audit entry.
        assert!(ledger.verify(&doc.id, &f.admin).unwrap());
        assert_eq!(audit.count().unwrap(), 2);
        assert_eq!(ledger.pending_count().unwrap(), 0);
    }

    #[test]
    fn verify_unknown_document_returns_false() {
        let f = fixture();
        let ledger = Ledger::new(&f.store);
        assert!(!ledger.verify(&DocumentId::from("doc_missing"), &f.admin).unwrap());
        assert_eq!(AuditLog::new(&f.store).count().unwrap(), 0);
    }

    #[test]
    fn verify_without_ledger_entry_returns_false() {
        let f = fixture();
        let ledger = Ledger::new(&f.store);
        let doc = ledger
            .record_upload(&report(), &f.doctor, &f.patient.id, StorageLocation::OnPremises)
            .unwrap();
        f.store.ledger().update(|entries| entries.clear()).unwrap();

        assert!(!ledger.verify(&doc.id, &f.admin).unwrap());
        assert_eq!(ledger.effective_status(&doc).unwrap(), None);
    }

    #[test]
    fn non_admin_cannot_verify() {
        let f = fixture();
        let ledger = Ledger::new(&f.store);
        let doc = ledger
            .record_upload(&report(), &f.doctor, &f.patient.id, StorageLocation::Cloud)
            .unwrap();

        let result = ledger.verify(&doc.id, &f.doctor);
        assert!(matches!(result, Err(DocurexError::Forbidden { role: Role::Doctor, .. })));
        assert_eq!(
            ledger.effective_status(&doc).unwrap(),
            Some(VerificationStatus::Pending)
        );
    }

    #[test]
    fn reupload_of_identical_file_is_disambiguated_by_document_id() {
        let f = fixture();
        let ledger = Ledger::new(&f.store);
        let first = ledger
            .record_upload(&report(), &f.doctor, &f.patient.id, StorageLocation::Cloud)
            .unwrap();
        let second = ledger
            .record_upload(&report(), &f.doctor, &f.patient.id, StorageLocation::Cloud)
            .unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(first.hash, second.hash);
        assert_eq!(ledger.entries().unwrap().len(), 2);

        assert!(ledger.verify(&second.id, &f.admin).unwrap());
        assert_eq!(
            ledger.effective_status(&first).unwrap(),
            Some(VerificationStatus::Pending)
        );
        assert_eq!(
            ledger.effective_status(&second).unwrap(),
            Some(VerificationStatus::Verified)
        );
        // Hash lookup still returns the first entry.
        let found = ledger.find_by_hash(&first.hash).unwrap().unwrap();
        assert_eq!(found.document_id.as_ref(), Some(&first.id));
    }

    #[test]
    fn legacy_entries_match_by_hash() {
        let f = fixture();
        let ledger = Ledger::new(&f.store);
        let doc = ledger
            .record_upload(&report(), &f.doctor, &f.patient.id, StorageLocation::Cloud)
            .unwrap();
        // Replace the entry with one lacking the back-reference.
        f.store.ledger().update(|entries| entries.clear()).unwrap();
        ledger.append_entry(&doc.hash, "Dr. Alice", Utc::now()).unwrap();

        assert!(ledger.verify(&doc.id, &f.admin).unwrap());
        assert!(ledger.find_by_hash(&doc.hash).unwrap().unwrap().is_verified());
    }

    #[test]
    fn checking_unknown_content_fails_cleanly() {
        let f = fixture();
        let ledger = Ledger::new(&f.store);
        ledger
            .record_upload(&report(), &f.doctor, &f.patient.id, StorageLocation::Cloud)
            .unwrap();

        let stranger = UploadedFile::new("report.pdf", "application/pdf", b"tampered".to_vec());
        let report_result = ledger.check_file(&stranger).unwrap();
        assert!(!report_result.success);
        assert!(report_result.entry.is_none());

        let genuine = ledger.check_file(&report()).unwrap();
        assert!(genuine.success);
        assert_eq!(
            genuine.entry.unwrap().verification_status,
            VerificationStatus::Pending
        );
    }

    #[test]
    fn upload_validation() {
        let f = fixture();
        let ledger = Ledger::new(&f.store);

        let unnamed = UploadedFile::new("", "text/plain", b"x".to_vec());
        assert!(matches!(
            ledger.record_upload(&unnamed, &f.doctor, &f.patient.id, StorageLocation::Cloud),
            Err(DocurexError::MissingField("file"))
        ));

        assert!(matches!(
            ledger.record_upload(&report(), &f.doctor, &UserId::from(""), StorageLocation::Cloud),
            Err(DocurexError::MissingField("patient"))
        ));

        // The doctor is a user but not a patient.
        assert!(matches!(
            ledger.record_upload(&report(), &f.doctor, &f.doctor.id, StorageLocation::Cloud),
            Err(DocurexError::InvalidPatient(_))
        ));

        assert!(matches!(
            ledger.record_upload(&report(), &f.patient, &f.patient.id, StorageLocation::Cloud),
            Err(DocurexError::Forbidden { .. })
        ));

        assert!(f.store.documents().is_empty().unwrap());
        assert!(ledger.entries().unwrap().is_empty());
    }

    #[test]
    fn failed_ledger_append_withdraws_document() {
        let (f, failing) = flaky_fixture(LEDGER_KEY);
        let ledger = Ledger::new(&f.store);

        failing.store(true, Ordering::SeqCst);
        let result = ledger.record_upload(&report(), &f.doctor, &f.patient.id, StorageLocation::Cloud);
        assert!(matches!(result, Err(DocurexError::Database(_))));
        failing.store(false, Ordering::SeqCst);

        assert!(f.store.documents().is_empty().unwrap());
        assert!(ledger.entries().unwrap().is_empty());
        assert_eq!(AuditLog::new(&f.store).count().unwrap(), 0);
    }

    #[test]
    fn failed_upload_audit_withdraws_document_and_entry() {
        let (f, failing) = flaky_fixture(AUDIT_KEY);
        let ledger = Ledger::new(&f.store);

        failing.store(true, Ordering::SeqCst);
        let result = ledger.record_upload(&report(), &f.doctor, &f.patient.id, StorageLocation::Cloud);
        assert!(matches!(result, Err(DocurexError::Database(_))));
        failing.store(false, Ordering::SeqCst);

        assert!(f.store.documents().is_empty().unwrap());
        assert!(ledger.entries().unwrap().is_empty());

        // Retrying yields exactly one document, one entry, one audit line.
        ledger
            .record_upload(&report(), &f.doctor, &f.patient.id, StorageLocation::Cloud)
            .unwrap();
        assert_eq!(f.store.documents().len().unwrap(), 1);
        assert_eq!(ledger.entries().unwrap().len(), 1);
        assert_eq!(AuditLog::new(&f.store).count().unwrap(), 1);
    }

    #[test]
    fn failed_verification_audit_reverts_status() {
        let (f, failing) = flaky_fixture(AUDIT_KEY);
        let ledger = Ledger::new(&f.store);
        let doc = ledger
            .record_upload(&report(), &f.doctor, &f.patient.id, StorageLocation::Cloud)
            .unwrap();

        failing.store(true, Ordering::SeqCst);
        assert!(ledger.verify(&doc.id, &f.admin).is_err());
        failing.store(false, Ordering::SeqCst);
        assert_eq!(
            ledger.effective_status(&doc).unwrap(),
            Some(VerificationStatus::Pending)
        );

        assert!(ledger.verify(&doc.id, &f.admin).unwrap());
        assert_eq!(
            ledger.effective_status(&doc).unwrap(),
            Some(VerificationStatus::Verified)
        );
        let verifications = AuditLog::new(&f.store)
            .entries()
            .unwrap()
            .into_iter()
            .filter(|e| e.action == "Document Verification")
            .count();
        assert_eq!(verifications, 1);
    }

    #[test]
    fn append_entry_is_pending() {
        let f = fixture();
        let ledger = Ledger::new(&f.store);
        let entry = ledger.append_entry("abc", "Dr. Alice", Utc::now()).unwrap();
        assert_eq!(entry.verification_status, VerificationStatus::Pending);
        assert_eq!(ledger.pending_count().unwrap(), 1);
        assert!(ledger.find_by_hash("abc").unwrap().is_some());
        assert!(ledger.find_by_hash("abd").unwrap().is_none());
    }
}
