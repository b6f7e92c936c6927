//! Client configuration schema for config.toml
//!
//! ```toml
//! organization = "acme"
//! deployment = "prod"
//! api_token = "user:..."
//! timeout_secs = 30
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::transport::AuthHeaders;

/// Connection settings for one organization/deployment pair.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub organization: String,

    #[serde(default)]
    pub deployment: String,

    #[serde(default)]
    pub api_token: String,

    /// Sent as the version header; defaults to this crate's version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Sent as the scope header; defaults to empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    /// Per-request timeout. Unset means requests are bounded only by the caller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("organization", &self.organization)
            .field("deployment", &self.deployment)
            .field("api_token", &"<redacted>")
            .field("version", &self.version)
            .field("scope", &self.scope)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl ClientConfig {
    pub fn new(
        organization: impl Into<String>,
        deployment: impl Into<String>,
        api_token: impl Into<String>,
    ) -> Self {
        Self {
            organization: organization.into(),
            deployment: deployment.into(),
            api_token: api_token.into(),
            ..Self::default()
        }
    }

    /// Check that every required field is set
    pub fn validate(&self) -> anyhow::Result<()> {
        let missing: Vec<&str> = [
            ("organization", &self.organization),
            ("deployment", &self.deployment),
            ("api_token", &self.api_token),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if !missing.is_empty() {
            anyhow::bail!("Missing required config values: {}", missing.join(", "));
        }
        Ok(())
    }

    pub fn auth_headers(&self) -> AuthHeaders {
        AuthHeaders {
            api_token: self.api_token.clone(),
            version: self
                .version
                .clone()
                .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string()),
            scope: self.scope.clone().unwrap_or_default(),
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}
