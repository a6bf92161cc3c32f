// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Plain-language error messages for portal users (clinicians, patients,
// administrators).
//
// Every failure path ends in a message someone can act on. Storage and I/O
// internals are never shown verbatim; they are logged and replaced with a
// generic "unexpected error" message.

use crate::error::DocurexError;

/// How the front end should treat an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Something the user asked for does not exist.
    NotFound,
    /// The user must change their input (duplicate email, missing field).
    ActionRequired,
    /// The user lacks the role or session for this operation.
    Denied,
    /// Something broke underneath the portal. Safe to try again.
    Unexpected,
}

/// A human-readable error with a plain message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Severity level (drives presentation).
    pub severity: Severity,
}

impl HumanError {
    fn unexpected() -> Self {
        HumanError {
            message: "An unexpected error occurred.".into(),
            suggestion: "Please try again. If this keeps happening, contact your administrator.".into(),
            severity: Severity::Unexpected,
        }
    }
}

/// Convert a `DocurexError` into a `HumanError`.
pub fn humanize_error(err: &DocurexError) -> HumanError {
    match err {
        // -- Validation --
        DocurexError::DuplicateEmail(_) => HumanError {
            message: "User with this email already exists.".into(),
            suggestion: "Use a different email address, or ask the existing user to sign in.".into(),
            severity: Severity::ActionRequired,
        },

        DocurexError::MissingField(field) => HumanError {
            message: format!("Please provide the {field}."),
            suggestion: "Fill in every required field and try again.".into(),
            severity: Severity::ActionRequired,
        },

        DocurexError::InvalidPatient(_) => HumanError {
            message: "Please select a file and a patient.".into(),
            suggestion: "Choose a patient from the list of registered patients.".into(),
            severity: Severity::ActionRequired,
        },

        DocurexError::UnknownValue(detail) => HumanError {
            message: format!("That {detail} isn't recognised."),
            suggestion: "Check the spelling and try again.".into(),
            severity: Severity::ActionRequired,
        },

        // -- Lookup --
        DocurexError::UserNotFound(_) => HumanError {
            message: "No account was found for those details.".into(),
            suggestion: "Check the email address, or ask an administrator to create an account.".into(),
            severity: Severity::NotFound,
        },

        DocurexError::DocumentNotFound(_) => HumanError {
            message: "Verification failed. Document or hash not found on ledger.".into(),
            suggestion: "Refresh the document list and try again.".into(),
            severity: Severity::NotFound,
        },

        // -- Authorization --
        DocurexError::NotSignedIn => HumanError {
            message: "You are not signed in.".into(),
            suggestion: "Sign in with your email address first.".into(),
            severity: Severity::Denied,
        },

        DocurexError::Forbidden { role, .. } => HumanError {
            message: format!("Your role ({role}) doesn't allow this action."),
            suggestion: "Ask an administrator if you need access.".into(),
            severity: Severity::Denied,
        },

        // -- Integrity --
        DocurexError::IntegrityMismatch { .. } => HumanError {
            message: "This file doesn't match the recorded version.".into(),
            suggestion: "The file may have been changed since it was uploaded. Obtain the original from its source.".into(),
            severity: Severity::ActionRequired,
        },

        // -- Storage / I/O --
        DocurexError::Io(io_err) if io_err.kind() == std::io::ErrorKind::NotFound => HumanError {
            message: "The file couldn't be found.".into(),
            suggestion: "It may have been moved or deleted. Try choosing the file again.".into(),
            severity: Severity::ActionRequired,
        },

        DocurexError::Database(_) | DocurexError::Io(_) | DocurexError::Serialization(_) => {
            HumanError::unexpected()
        }

        // -- AI assistant --
        DocurexError::AssistantUnavailable(env) => HumanError {
            message: format!(
                "The AI assistant is not configured. Please set up the {env} environment variable."
            ),
            suggestion: "Ask an administrator to configure the assistant credential.".into(),
            severity: Severity::Unexpected,
        },

        DocurexError::Assistant(detail) => HumanError {
            message: format!(
                "An error occurred while contacting the AI assistant. Details: {detail}"
            ),
            suggestion: "Try again in a moment.".into(),
            severity: Severity::Unexpected,
        },
    }
}
