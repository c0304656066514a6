//! Recorded state of a `vault_secret_backend` resource.

use serde::{Deserialize, Serialize};

/// Attributes of a managed mount as last observed in Vault.
///
/// `id` is the mount path without a trailing slash. An empty `id` means the
/// mount no longer exists and must be created again.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceData {
    pub id: String,
    pub path: String,
    #[serde(rename = "type")]
    pub engine_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub default_lease_ttl_seconds: i64,
    #[serde(default)]
    pub max_lease_ttl_seconds: i64,
}

impl ResourceData {
    /// State holding only an identity, as produced by import.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Whether the resource currently has an identity.
    pub fn is_present(&self) -> bool {
        !self.id.is_empty()
    }

    /// Forget the identity so the mount is recreated on the next apply.
    pub fn clear_id(&mut self) {
        self.id.clear();
    }
}

/// Key under which Vault lists the mount identified by `id`.
pub fn mount_key(id: &str) -> String {
    format!("{}/", id.trim_matches('/'))
}
