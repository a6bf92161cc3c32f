// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic definition of the AI assistant boundary.
//
// The portal only ever sends a free-text prompt, optionally with one file,
// and reads back free text.  Everything else (model choice, transport,
// credentials) belongs to the implementation.

use docurex_core::error::Result;

/// Standing instruction for text-only prompts.
pub const SYSTEM_INSTRUCTION: &str = "You are Docu-Rex AI, a helpful assistant for healthcare. \
Explain medical concepts clearly and concisely. When summarizing documents, be precise and focus \
on key findings. Always state that you are an AI and not a medical professional, and the user \
should consult a doctor.";

/// A file sent alongside a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }
}

/// A generative-AI collaborator.
///
/// Calls block; async callers should go through `spawn_blocking`.
pub trait Assistant: Send + Sync {
    /// Short name for logs (e.g. "unconfigured").
    fn name(&self) -> &str;

    /// Answer `prompt`, optionally about `attachment`.
    fn generate(&self, prompt: &str, attachment: Option<&Attachment>) -> Result<String>;
}
