// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Docu-Rex Bridge: the boundary to the external AI assistant.
//
// The rest of the workspace talks to `dyn Assistant` only.  `run_analysis`
// is the call the portal makes; it never fails and turns every error into
// the text shown to the user.

pub mod stub;
pub mod traits;

use docurex_core::config::AppConfig;
use docurex_core::error::DocurexError;
use docurex_core::human_errors::humanize_error;
use tracing::{debug, error, instrument};

pub use traits::{Assistant, Attachment, SYSTEM_INSTRUCTION};

/// Build the assistant for this configuration.
///
/// The credential is looked up in the environment variable named by
/// `assistant_api_key_env`; an empty value counts as missing.
pub fn assistant_from_config(config: &AppConfig) -> Box<dyn Assistant> {
    let key_present = std::env::var(&config.assistant_api_key_env)
        .map(|v| !v.trim().is_empty())
        .unwrap_or(false);
    if !key_present {
        tracing::warn!(
            env = %config.assistant_api_key_env,
            "AI assistant key not found; AI features will be disabled"
        );
    }
    Box::new(stub::UnconfiguredAssistant::new(
        config.assistant_api_key_env.clone(),
        key_present,
    ))
}

/// Ask `assistant` and return its answer, or a user-facing message
/// describing why there is none.
#[instrument(skip_all, fields(assistant = assistant.name(), attached = attachment.is_some()))]
pub fn run_analysis(
    assistant: &dyn Assistant,
    prompt: &str,
    attachment: Option<&Attachment>,
) -> String {
    match assistant.generate(prompt, attachment) {
        Ok(text) => {
            debug!(len = text.len(), "assistant answered");
            text
        }
        Err(e) => {
            if !matches!(e, DocurexError::AssistantUnavailable(_)) {
                error!(error = %e, "assistant call failed");
            }
            humanize_error(&e).message
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docurex_core::error::Result;

    struct Echo;

    impl Assistant for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        fn generate(&self, prompt: &str, attachment: Option<&Attachment>) -> Result<String> {
            Ok(match attachment {
                Some(a) => format!("{prompt} [{}]", a.name),
                None => prompt.to_owned(),
            })
        }
    }

    struct Broken;

    impl Assistant for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn generate(&self, _prompt: &str, _attachment: Option<&Attachment>) -> Result<String> {
            Err(DocurexError::Assistant("connection reset".into()))
        }
    }

    #[test]
    fn answers_pass_through() {
        assert_eq!(run_analysis(&Echo, "hello", None), "hello");
        let scan = Attachment::new("scan.png", "image/png", vec![1, 2, 3]);
        assert_eq!(run_analysis(&Echo, "describe", Some(&scan)), "describe [scan.png]");
    }

    #[test]
    fn transport_failure_becomes_message() {
        let text = run_analysis(&Broken, "hello", None);
        assert!(text.starts_with("An error occurred while contacting the AI assistant."));
        assert!(text.contains("connection reset"));
    }

    #[test]
    fn missing_credential_becomes_message() {
        let config = AppConfig {
            assistant_api_key_env: "DOCUREX_TEST_KEY_THAT_IS_NEVER_SET".into(),
            ..AppConfig::default()
        };
        let assistant = assistant_from_config(&config);
        let text = run_analysis(assistant.as_ref(), "hello", None);
        assert!(text.contains("DOCUREX_TEST_KEY_THAT_IS_NEVER_SET"));
    }
}
