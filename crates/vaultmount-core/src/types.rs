//! Wire types for Vault's `sys/mounts` endpoints.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ttl::deserialize_ttl;

/// Request body for `POST /v1/sys/mounts/{path}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MountInput {
    /// Secret engine type (e.g., `kv`, `ssh`, `pki`).
    #[serde(rename = "type")]
    pub engine_type: String,
    /// Human-friendly description of the mount.
    pub description: String,
    /// Lease TTL configuration.
    pub config: MountConfigInput,
}

/// TTL configuration sent on mount and tune. Values are duration strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MountConfigInput {
    pub default_lease_ttl: String,
    pub max_lease_ttl: String,
}

/// A single mount as reported by `GET /v1/sys/mounts`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MountOutput {
    /// Secret engine type.
    #[serde(rename = "type")]
    pub engine_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub accessor: String,
    #[serde(default)]
    pub config: MountConfigOutput,
    #[serde(default)]
    pub local: bool,
    #[serde(default)]
    pub seal_wrap: bool,
    /// Engine-specific options (e.g., `version` for KV).
    #[serde(default)]
    pub options: Option<HashMap<String, String>>,
}

/// TTL configuration of a mount, normalized to seconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MountConfigOutput {
    #[serde(default, deserialize_with = "deserialize_ttl")]
    pub default_lease_ttl: i64,
    #[serde(default, deserialize_with = "deserialize_ttl")]
    pub max_lease_ttl: i64,
    #[serde(default)]
    pub force_no_cache: bool,
}

/// Vault's error body: `{"errors": ["..."]}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub errors: Vec<String>,
}
