use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;

const DEFAULT_USER_AGENT: &str = concat!("consent-risk/", env!("CARGO_PKG_VERSION"));

/// Environment- or file-driven configuration for the remote analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AnalyzerSettings {
    /// Process-wide endpoint override, consulted after the per-call override.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Optional client-wide timeout. Unset or `0` means the request may wait indefinitely.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_secs: None,
            user_agent: default_user_agent(),
        }
    }
}

impl AnalyzerSettings {
    pub const ENDPOINT_ENV: &'static str = "CONSENT_RISK_ENDPOINT";
    pub const TIMEOUT_ENV: &'static str = "CONSENT_RISK_TIMEOUT_SECS";

    /// Load settings from environment variables.
    ///
    /// * `CONSENT_RISK_ENDPOINT`: process-wide endpoint override.
    /// * `CONSENT_RISK_TIMEOUT_SECS`: request timeout in seconds; ignored if unparseable or `0`.
    pub fn from_env() -> Self {
        Self::from_map(std::env::vars().collect())
    }

    fn from_map(vars: HashMap<String, String>) -> Self {
        let endpoint = vars
            .get(Self::ENDPOINT_ENV)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        let timeout_secs = vars
            .get(Self::TIMEOUT_ENV)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0);
        Self {
            endpoint,
            timeout_secs,
            ..Self::default()
        }
    }

    /// Fill unset values from `fallback`, keeping values already present on `self`.
    pub fn or(self, fallback: AnalyzerSettings) -> Self {
        Self {
            endpoint: self
                .endpoint
                .filter(|v| !v.trim().is_empty())
                .or(fallback.endpoint),
            timeout_secs: self
                .timeout_secs
                .filter(|secs| *secs > 0)
                .or(fallback.timeout_secs.filter(|secs| *secs > 0)),
            user_agent: if self.user_agent == DEFAULT_USER_AGENT {
                fallback.user_agent
            } else {
                self.user_agent
            },
        }
    }

    /// Request timeout to hand to the HTTP client, if one is set.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}
