// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Docu-Rex document portal.
//
// Field names serialize in camelCase (`documentHash`, `verificationStatus`,
// `storageLocation`, ...); that is the on-disk layout of every collection.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DocurexError;

/// Unique identifier for a user account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Fresh identifier for a newly registered account.
    pub fn new() -> Self {
        Self(format!("user_{}", Uuid::new_v4()))
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Unique identifier for an uploaded document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub String);

impl DocumentId {
    pub fn new() -> Self {
        Self(format!("doc_{}", Uuid::new_v4()))
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Account role. Drives route access and document visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Doctor,
    Patient,
    Researcher,
    Auditor,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Admin,
        Role::Doctor,
        Role::Patient,
        Role::Researcher,
        Role::Auditor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::Doctor => "Doctor",
            Self::Patient => "Patient",
            Self::Researcher => "Researcher",
            Self::Auditor => "Auditor",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DocurexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DocurexError::UnknownValue(format!("role '{s}'")))
    }
}

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl User {
    pub fn new(name: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            id: UserId::new(),
            name: name.into(),
            email: email.into(),
            role,
        }
    }
}

/// Where an uploaded document is said to live. Purely descriptive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StorageLocation {
    #[default]
    #[serde(rename = "On-Premises")]
    OnPremises,
    Cloud,
}

impl StorageLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OnPremises => "On-Premises",
            Self::Cloud => "Cloud",
        }
    }
}

impl fmt::Display for StorageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageLocation {
    type Err = DocurexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "on-premises" | "onpremises" | "on-prem" | "onprem" => Ok(Self::OnPremises),
            "cloud" => Ok(Self::Cloud),
            _ => Err(DocurexError::UnknownValue(format!("storage location '{s}'"))),
        }
    }
}

/// An uploaded medical document. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: DocumentId,
    pub name: String,
    /// MIME type reported at upload time.
    #[serde(rename = "type")]
    pub mime_type: String,
    pub size: u64,
    pub upload_date: DateTime<Utc>,
    pub uploader_id: UserId,
    pub patient_id: UserId,
    /// SHA-256 content address of (name, size, content).
    pub hash: String,
    pub storage_location: StorageLocation,
}

/// Ledger confirmation state. `Pending -> Verified` is the only transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerificationStatus {
    Pending,
    Verified,
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str("Pending"),
            Self::Verified => f.write_str("Verified"),
        }
    }
}

/// One record on the append-only document ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub document_hash: String,
    /// Display name of the uploader.
    pub uploader: String,
    pub timestamp: DateTime<Utc>,
    pub verification_status: VerificationStatus,
    /// Back-reference to the document this entry was created for. Absent on
    /// entries written before the field existed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<DocumentId>,
}

impl LedgerEntry {
    pub fn new(
        document_hash: impl Into<String>,
        uploader: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            document_hash: document_hash.into(),
            uploader: uploader.into(),
            timestamp,
            verification_status: VerificationStatus::Pending,
            document_id: None,
        }
    }

    pub fn for_document(mut self, id: DocumentId) -> Self {
        self.document_id = Some(id);
        self
    }

    pub fn is_verified(&self) -> bool {
        self.verification_status == VerificationStatus::Verified
    }
}

/// One line of the audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    pub id: String,
    pub action: String,
    pub user_id: UserId,
    pub user_name: String,
    pub user_role: Role,
    pub timestamp: DateTime<Utc>,
    pub details: String,
}

/// The signed-in user, passed explicitly to every authorized operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user: User,
    pub started_at: DateTime<Utc>,
}

impl Session {
    pub fn new(user: User) -> Self {
        Self {
            user,
            started_at: Utc::now(),
        }
    }

    pub fn role(&self) -> Role {
        self.user.role
    }
}

/// A file handed to the portal for upload or verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Guess a MIME type from the file extension, falling back to
    /// `application/octet-stream`.
    pub fn mime_from_name(name: &str) -> &'static str {
        let ext = name.rsplit_once('.').map(|(_, e)| e).unwrap_or_default();
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => "application/pdf",
            "jpg" | "jpeg" => "image/jpeg",
            "png" => "image/png",
            "txt" => "text/plain",
            "json" => "application/json",
            "csv" => "text/csv",
            "dcm" => "application/dicom",
            _ => "application/octet-stream",
        }
    }
}

/// Result of checking a file against the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub success: bool,
    pub entry: Option<LedgerEntry>,
}

impl VerificationReport {
    pub fn from_entry(entry: Option<LedgerEntry>) -> Self {
        Self {
            success: entry.is_some(),
            entry,
        }
    }
}

/// Structured `{success, message}` result for operations whose failures are
/// shown to the user verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub success: bool,
    pub message: String,
}

impl Outcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Counters shown on the admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_users: usize,
    pub documents_stored: usize,
    pub pending_verifications: usize,
    pub audit_events: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!("doctor".parse::<Role>().unwrap(), Role::Doctor);
        assert_eq!(" Auditor ".parse::<Role>().unwrap(), Role::Auditor);
        assert!("nurse".parse::<Role>().is_err());
    }

    #[test]
    fn storage_location_uses_display_names_on_the_wire() {
        let json = serde_json::to_string(&StorageLocation::OnPremises).unwrap();
        assert_eq!(json, "\"On-Premises\"");
        assert_eq!("cloud".parse::<StorageLocation>().unwrap(), StorageLocation::Cloud);
    }

    #[test]
    fn document_serializes_with_camel_case_field_names() {
        let doc = Document {
            id: DocumentId::from("doc_1"),
            name: "report.pdf".into(),
            mime_type: "application/pdf".into(),
            size: 500,
            upload_date: Utc::now(),
            uploader_id: UserId::from("1"),
            patient_id: UserId::from("2"),
            hash: "ab".into(),
            storage_location: StorageLocation::Cloud,
        };
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["type"], "application/pdf");
        assert_eq!(value["patientId"], "2");
        assert_eq!(value["storageLocation"], "Cloud");
        assert!(value.get("uploadDate").is_some());
    }

    #[test]
    fn legacy_ledger_entry_without_document_id_parses() {
        let json = r#"{
            "documentHash": "abc",
            "uploader": "Dr. Alice",
            "timestamp": "2025-01-01T00:00:00Z",
            "verificationStatus": "Pending"
        }"#;
        let entry: LedgerEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.verification_status, VerificationStatus::Pending);
        assert!(entry.document_id.is_none());
    }

    #[test]
    fn generated_ids_carry_prefixes() {
        assert!(UserId::new().0.starts_with("user_"));
        assert!(DocumentId::new().0.starts_with("doc_"));
        assert_ne!(DocumentId::new(), DocumentId::new());
    }

    #[test]
    fn mime_guess_from_extension() {
        assert_eq!(UploadedFile::mime_from_name("scan.PDF"), "application/pdf");
        assert_eq!(UploadedFile::mime_from_name("noext"), "application/octet-stream");
    }
}
