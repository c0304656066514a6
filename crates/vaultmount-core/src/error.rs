//! Error types for `vaultmount-core`.
//!
//! Validation errors are raised before any request leaves the process.
//! Client errors describe what Vault (or the transport) said. Resource
//! errors wrap client errors with the lifecycle action and mount path so
//! the message alone is enough to diagnose a failed run.

/// Errors from validating a declared resource configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The mount path ends with `/`.
    #[error("path cannot end in '/'")]
    TrailingSlash,

    /// A required attribute is missing or empty.
    #[error("attribute '{attribute}' is required")]
    Required { attribute: &'static str },

    /// A TTL attribute is negative.
    #[error("attribute '{attribute}' must not be negative, got {value}")]
    NegativeTtl { attribute: &'static str, value: i64 },
}

/// Errors from parsing a Vault duration string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DurationError {
    /// The input was empty.
    #[error("empty duration")]
    Empty,

    /// The input could not be parsed as a duration.
    #[error("invalid duration '{input}'")]
    Invalid { input: String },

    /// The input used a unit that is not recognized.
    #[error("unknown unit '{unit}' in duration '{input}'")]
    UnknownUnit { unit: String, input: String },

    /// The value does not fit into an `i64` number of seconds.
    #[error("duration '{input}' overflows")]
    Overflow { input: String },
}

/// Errors from talking to the Vault HTTP API.
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    /// The client configuration is unusable (missing token, bad address).
    #[error("vault config error: {0}")]
    Config(String),

    /// Vault rejected the token (401/403).
    #[error("permission denied: {}", .errors.join(", "))]
    PermissionDenied { errors: Vec<String> },

    /// Vault returned a non-success status.
    #[error("vault API error {status}: {}", .errors.join(", "))]
    Api { status: u16, errors: Vec<String> },

    /// Vault returned a body we could not interpret.
    #[error("unexpected vault response: {0}")]
    Decode(String),

    /// Network or HTTP client error.
    #[error("vault network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization/deserialization error.
    #[error("vault json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors from the secret-backend lifecycle handlers.
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    /// The declared configuration is invalid; no request was sent.
    #[error("invalid configuration: {0}")]
    Validation(#[from] ValidationError),

    /// Mounting the backend failed.
    #[error("error mounting {engine_type:?} secret backend to {path:?}: {source}")]
    Mount {
        engine_type: String,
        path: String,
        #[source]
        source: VaultError,
    },

    /// Listing mounts failed while reading a backend.
    #[error("error reading mount {path:?}: {source}")]
    Read {
        path: String,
        #[source]
        source: VaultError,
    },

    /// Tuning lease TTLs failed.
    #[error("error updating mount TTLs for {path:?}: {source}")]
    Tune {
        path: String,
        #[source]
        source: VaultError,
    },

    /// Unmounting the backend failed.
    #[error("error unmounting secret backend from {path:?}: {source}")]
    Unmount {
        path: String,
        #[source]
        source: VaultError,
    },

    /// Listing mounts failed during an existence check.
    #[error("error retrieving list of mounts: {source}")]
    List {
        #[source]
        source: VaultError,
    },

    /// Import was asked for a mount that Vault does not have.
    #[error("cannot import non-existent mount {path:?}")]
    ImportNotFound { path: String },
}
