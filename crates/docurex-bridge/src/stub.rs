// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stub assistant for builds without a generative-AI transport.
//
// With no credential it reports `AssistantUnavailable`; with one it reports
// that no transport is linked.  Either way the caller gets an error it can
// turn into a message.

use docurex_core::error::{DocurexError, Result};

use crate::traits::{Assistant, Attachment};

pub struct UnconfiguredAssistant {
    key_env: String,
    key_present: bool,
}

impl UnconfiguredAssistant {
    pub fn new(key_env: impl Into<String>, key_present: bool) -> Self {
        Self {
            key_env: key_env.into(),
            key_present,
        }
    }
}

impl Assistant for UnconfiguredAssistant {
    fn name(&self) -> &str {
        "unconfigured"
    }

    fn generate(&self, _prompt: &str, _attachment: Option<&Attachment>) -> Result<String> {
        if !self.key_present {
            tracing::warn!(env = %self.key_env, "assistant credential not set");
            return Err(DocurexError::AssistantUnavailable(self.key_env.clone()));
        }
        tracing::warn!("Assistant::generate called on stub assistant");
        Err(DocurexError::Assistant(
            "no generative-AI transport is available in this build".into(),
        ))
    }
}
