//! Core library for `vaultmount`.
//!
//! Manages a single secret-engine mount in HashiCorp Vault as a declarative
//! resource (`vault_secret_backend`): the attribute schema, the recorded
//! state, the lifecycle handlers (create, read, update, delete, exists,
//! import), the plan that decides between update and replacement, and the
//! `sys/mounts` HTTP client they all call into.
//!
//! # Example
//!
//! ```rust,no_run
//! use vaultmount_core::client::VaultClient;
//! use vaultmount_core::config::ClientConfig;
//! use vaultmount_core::resource::SecretBackend;
//! use vaultmount_core::schema::SecretBackendConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = VaultClient::new(&ClientConfig::from_env())?;
//! let backend = SecretBackend::new(client);
//! let state = backend
//!     .create(&SecretBackendConfig {
//!         engine_type: "ssh".to_owned(),
//!         path: Some("ssh-test".to_owned()),
//!         default_lease_ttl_seconds: Some(3600),
//!         ..SecretBackendConfig::default()
//!     })
//!     .await?;
//! assert_eq!(state.id, "ssh-test");
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod plan;
pub mod resource;
pub mod schema;
pub mod state;
pub mod ttl;
pub mod types;
