//! Attribute schema of the `vault_secret_backend` resource.
//!
//! The schema decides which attributes are required, which can be changed
//! in place, and which force the mount to be replaced. The lifecycle
//! handlers in [`crate::resource`] rely on it: they never check mutability
//! themselves.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Name under which the resource is registered.
pub const RESOURCE_TYPE: &str = "vault_secret_backend";

pub const ATTR_TYPE: &str = "type";
pub const ATTR_PATH: &str = "path";
pub const ATTR_DESCRIPTION: &str = "description";
pub const ATTR_DEFAULT_LEASE_TTL: &str = "default_lease_ttl_seconds";
pub const ATTR_MAX_LEASE_TTL: &str = "max_lease_ttl_seconds";

/// Value kind of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    String,
    Int,
}

/// Declaration of a single resource attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribute {
    pub name: &'static str,
    pub kind: AttributeKind,
    pub required: bool,
    pub optional: bool,
    /// The server fills the value in when the configuration omits it.
    pub computed: bool,
    /// Changing the value replaces the mount instead of updating it.
    pub force_new: bool,
    pub description: &'static str,
}

/// The full attribute schema.
pub static SCHEMA: [Attribute; 5] = [
    Attribute {
        name: ATTR_TYPE,
        kind: AttributeKind::String,
        required: true,
        optional: false,
        computed: false,
        force_new: true,
        description: "Name of the secret backend",
    },
    Attribute {
        name: ATTR_PATH,
        kind: AttributeKind::String,
        required: false,
        optional: true,
        computed: false,
        force_new: true,
        description: "Path to mount the backend at, defaults to the type",
    },
    Attribute {
        name: ATTR_DESCRIPTION,
        kind: AttributeKind::String,
        required: false,
        optional: true,
        computed: false,
        force_new: true,
        description: "Human-friendly description of the mount for the backend.",
    },
    Attribute {
        name: ATTR_DEFAULT_LEASE_TTL,
        kind: AttributeKind::Int,
        required: false,
        optional: true,
        computed: true,
        force_new: false,
        description: "Default lease duration for secrets in seconds.",
    },
    Attribute {
        name: ATTR_MAX_LEASE_TTL,
        kind: AttributeKind::Int,
        required: false,
        optional: true,
        computed: true,
        force_new: false,
        description: "Maximum possible lease duration for secrets in seconds.",
    },
];

/// Look up an attribute declaration by name.
pub fn attribute(name: &str) -> Option<&'static Attribute> {
    SCHEMA.iter().find(|a| a.name == name)
}

/// Reject mount paths that end in `/`.
///
/// # Errors
///
/// Returns [`ValidationError::TrailingSlash`].
pub fn validate_path(path: &str) -> Result<(), ValidationError> {
    if path.ends_with('/') {
        return Err(ValidationError::TrailingSlash);
    }
    Ok(())
}

/// Two paths that differ only by one trailing slash are the same mount.
pub fn suppress_path_diff(old: &str, new: &str) -> bool {
    old == new || format!("{old}/") == new || format!("{new}/") == old
}

/// Declared configuration of a `vault_secret_backend` resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SecretBackendConfig {
    #[serde(rename = "type")]
    pub engine_type: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub default_lease_ttl_seconds: Option<i64>,
    #[serde(default)]
    pub max_lease_ttl_seconds: Option<i64>,
}

impl SecretBackendConfig {
    /// Validate every attribute against the schema.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.engine_type.is_empty() {
            return Err(ValidationError::Required {
                attribute: ATTR_TYPE,
            });
        }
        if let Some(path) = &self.path {
            validate_path(path)?;
        }
        for (attribute, value) in [
            (ATTR_DEFAULT_LEASE_TTL, self.default_lease_ttl_seconds),
            (ATTR_MAX_LEASE_TTL, self.max_lease_ttl_seconds),
        ] {
            if let Some(v) = value.filter(|v| *v < 0) {
                return Err(ValidationError::NegativeTtl {
                    attribute,
                    value: v,
                });
            }
        }
        Ok(())
    }

    /// Mount path, falling back to the engine type when unset or empty.
    pub fn effective_path(&self) -> &str {
        match self.path.as_deref() {
            Some(p) if !p.is_empty() => p,
            _ => &self.engine_type,
        }
    }

    /// Description, empty when unset.
    pub fn effective_description(&self) -> &str {
        self.description.as_deref().unwrap_or_default()
    }
}
