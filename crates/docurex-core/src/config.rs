// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Artificial delay applied before an operation resolves.
///
/// Production runs use `None`.  The other variants simulate a remote backend
/// (100-500 ms per call, 2-4 s for transaction confirmation) for demos and
/// latency-sensitive tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Latency {
    #[default]
    None,
    /// Always wait exactly `ms` milliseconds.
    Fixed { ms: u64 },
    /// Wait a uniformly random time in `min_ms..=max_ms`.
    Jitter { min_ms: u64, max_ms: u64 },
}

impl Latency {
    /// Simulated per-call delay.
    pub const SIMULATED_CALL: Latency = Latency::Jitter {
        min_ms: 100,
        max_ms: 500,
    };

    /// Simulated wallet confirmation delay.
    pub const SIMULATED_CONFIRMATION: Latency = Latency::Jitter {
        min_ms: 2_000,
        max_ms: 4_000,
    };

    /// Draw the delay for one operation.
    pub fn sample(&self) -> Duration {
        match *self {
            Self::None => Duration::ZERO,
            Self::Fixed { ms } => Duration::from_millis(ms),
            Self::Jitter { min_ms, max_ms } => {
                let (lo, hi) = if min_ms <= max_ms {
                    (min_ms, max_ms)
                } else {
                    (max_ms, min_ms)
                };
                Duration::from_millis(rand::thread_rng().gen_range(lo..=hi))
            }
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// Persistent application settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Delay applied to every portal call.
    pub latency: Latency,
    /// Delay before a wallet transaction flips to confirmed.
    pub confirmation_latency: Latency,
    /// Write the three demo accounts when the users key is absent or corrupt.
    pub seed_default_users: bool,
    /// Environment variable holding the AI assistant credential.
    pub assistant_api_key_env: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            latency: Latency::None,
            confirmation_latency: Latency::None,
            seed_default_users: true,
            assistant_api_key_env: "DOCUREX_AI_API_KEY".into(),
        }
    }
}

impl AppConfig {
    /// Settings with the simulated delays switched on.
    pub fn simulated() -> Self {
        Self {
            latency: Latency::SIMULATED_CALL,
            confirmation_latency: Latency::SIMULATED_CONFIRMATION,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_is_zero() {
        assert_eq!(Latency::None.sample(), Duration::ZERO);
    }

    #[test]
    fn jitter_stays_in_range() {
        let latency = Latency::Jitter {
            min_ms: 100,
            max_ms: 500,
        };
        for _ in 0..100 {
            let d = latency.sample();
            assert!(d >= Duration::from_millis(100) && d <= Duration::from_millis(500));
        }
    }

    #[test]
    fn inverted_jitter_bounds_are_tolerated() {
        let d = Latency::Jitter {
            min_ms: 20,
            max_ms: 10,
        }
        .sample();
        assert!(d >= Duration::from_millis(10) && d <= Duration::from_millis(20));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let cfg: AppConfig =
            serde_json::from_str(r#"{"latency":{"kind":"fixed","ms":250}}"#).unwrap();
        assert_eq!(cfg.latency, Latency::Fixed { ms: 250 });
        assert!(cfg.seed_default_users);
        assert_eq!(cfg.confirmation_latency, Latency::None);
    }

    #[test]
    fn production_default_has_no_delay() {
        let cfg = AppConfig::default();
        assert!(cfg.latency.is_none());
        assert!(cfg.confirmation_latency.is_none());
        assert!(!AppConfig::simulated().latency.is_none());
    }
}
