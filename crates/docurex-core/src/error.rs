// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Docu-Rex.

use thiserror::Error;

use crate::types::Role;

/// Top-level error type for all Docu-Rex operations.
#[derive(Debug, Error)]
pub enum DocurexError {
    // -- Validation --
    #[error("a user with email {0} already exists")]
    DuplicateEmail(String),

    #[error("required field missing: {0}")]
    MissingField(&'static str),

    #[error("{0} is not a registered patient")]
    InvalidPatient(String),

    #[error("unknown value: {0}")]
    UnknownValue(String),

    // -- Lookup --
    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("document not found: {0}")]
    DocumentNotFound(String),

    // -- Authorization --
    #[error("no active session")]
    NotSignedIn,

    #[error("role {role} may not {action}")]
    Forbidden { role: Role, action: String },

    // -- Integrity --
    #[error("integrity check failed: expected {expected}, got {actual}")]
    IntegrityMismatch { expected: String, actual: String },

    // -- Storage / persistence --
    #[error("database error: {0}")]
    Database(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -- AI assistant boundary --
    #[error("AI assistant is not configured: {0}")]
    AssistantUnavailable(String),

    #[error("AI assistant request failed: {0}")]
    Assistant(String),
}

impl DocurexError {
    /// Whether this is a validation failure the user can fix by changing
    /// their input.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::DuplicateEmail(_)
                | Self::MissingField(_)
                | Self::InvalidPatient(_)
                | Self::UnknownValue(_)
        )
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DocurexError>;
