//! Vault client configuration.
//!
//! Loads settings from the standard `VAULT_*` environment variables with
//! sensible defaults. Callers (the CLI) may override individual fields
//! after loading.

use std::time::Duration;

/// Default Vault address when `VAULT_ADDR` is unset.
pub const DEFAULT_ADDR: &str = "http://127.0.0.1:8200";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Connection settings for [`crate::client::VaultClient`].
#[derive(Clone)]
pub struct ClientConfig {
    /// Base address of the Vault server (e.g., `https://vault.example.com:8200`).
    pub addr: String,
    /// Token sent as `X-Vault-Token`.
    pub token: String,
    /// Enterprise namespace sent as `X-Vault-Namespace`, if any.
    pub namespace: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_owned(),
            token: String::new(),
            namespace: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `VAULT_ADDR` — server address (default: `http://127.0.0.1:8200`)
    /// - `VAULT_TOKEN` — authentication token (default: empty)
    /// - `VAULT_NAMESPACE` — enterprise namespace (optional)
    /// - `VAULT_CLIENT_TIMEOUT` — request timeout in seconds (default: `60`)
    #[must_use]
    pub fn from_env() -> Self {
        let addr = std::env::var("VAULT_ADDR")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_ADDR.to_owned());

        let token = std::env::var("VAULT_TOKEN").unwrap_or_default();

        let namespace = std::env::var("VAULT_NAMESPACE")
            .ok()
            .filter(|v| !v.is_empty());

        let timeout = timeout_from(std::env::var("VAULT_CLIENT_TIMEOUT").ok().as_deref());

        Self {
            addr,
            token,
            namespace,
            timeout,
        }
    }
}

/// Parse a timeout in whole seconds. Zero, negative or unparsable values
/// fall back to [`DEFAULT_TIMEOUT`].
fn timeout_from(raw: Option<&str>) -> Duration {
    raw.and_then(|v| v.trim().parse().ok())
        .filter(|s: &u64| *s > 0)
        .map_or(DEFAULT_TIMEOUT, Duration::from_secs)
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("addr", &self.addr)
            .field("token", &"<redacted>")
            .field("namespace", &self.namespace)
            .field("timeout", &self.timeout)
            .finish()
    }
}
