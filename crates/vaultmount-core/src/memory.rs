//! In-memory `sys/mounts` backend for testing.
//!
//! Compiled for this crate's own tests and behind the `test-util` feature.
//!
//! Mimics the parts of Vault's mount table the resource relies on: mounts
//! are keyed by path with a trailing slash, TTL strings are parsed into
//! seconds, duplicate mounts are rejected, and unmounting a missing path
//! succeeds. Every call is counted so tests can assert that validation
//! failures never reach the server.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tokio::sync::RwLock;

use crate::client::SysMounts;
use crate::error::VaultError;
use crate::state::mount_key;
use crate::ttl::parse_duration;
use crate::types::{MountConfigInput, MountConfigOutput, MountInput, MountOutput};

/// An in-memory mount table implementing [`SysMounts`].
#[derive(Debug, Clone, Default)]
pub struct MemoryMounts {
    mounts: Arc<RwLock<BTreeMap<String, MountOutput>>>,
    requests: Arc<AtomicUsize>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryMounts {
    /// Create an empty mount table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `SysMounts` calls made so far.
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Make every subsequent call fail as if the server were sealed.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Remove a mount behind the resource's back, simulating drift.
    pub async fn remove_out_of_band(&self, path: &str) {
        self.mounts.write().await.remove(&mount_key(path));
    }

    /// Current entry for `path`, if mounted.
    pub async fn get(&self, path: &str) -> Option<MountOutput> {
        self.mounts.read().await.get(&mount_key(path)).cloned()
    }

    fn begin(&self) -> Result<(), VaultError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(VaultError::Api {
                status: 503,
                errors: vec!["Vault is sealed".to_owned()],
            });
        }
        Ok(())
    }
}

fn bad_request(message: String) -> VaultError {
    VaultError::Api {
        status: 400,
        errors: vec![message],
    }
}

fn parse_ttls(config: &MountConfigInput) -> Result<(i64, i64), VaultError> {
    let default = parse_duration(&config.default_lease_ttl)
        .map_err(|e| bad_request(format!("invalid default_lease_ttl: {e}")))?;
    let max = parse_duration(&config.max_lease_ttl)
        .map_err(|e| bad_request(format!("invalid max_lease_ttl: {e}")))?;
    if max > 0 && default > max {
        return Err(bad_request(
            "default lease TTL cannot be greater than max lease TTL".to_owned(),
        ));
    }
    Ok((default, max))
}

#[async_trait::async_trait]
impl SysMounts for MemoryMounts {
    async fn mount(&self, path: &str, input: &MountInput) -> Result<(), VaultError> {
        self.begin()?;
        if input.engine_type.is_empty() {
            return Err(bad_request("plugin not found in the catalog: ".to_owned()));
        }
        let key = mount_key(path);
        if key == "/" {
            return Err(bad_request("missing mount path".to_owned()));
        }
        let (default, max) = parse_ttls(&input.config)?;

        let mut mounts = self.mounts.write().await;
        if mounts.contains_key(&key) {
            return Err(bad_request(format!("path is already in use at {key}")));
        }
        let accessor = format!("{}_{:08x}", input.engine_type, mounts.len());
        mounts.insert(
            key,
            MountOutput {
                engine_type: input.engine_type.clone(),
                description: input.description.clone(),
                accessor,
                config: MountConfigOutput {
                    default_lease_ttl: default,
                    max_lease_ttl: max,
                    force_no_cache: false,
                },
                local: false,
                seal_wrap: false,
                options: None,
            },
        );
        Ok(())
    }

    async fn list_mounts(&self) -> Result<HashMap<String, MountOutput>, VaultError> {
        self.begin()?;
        let mounts = self.mounts.read().await;
        Ok(mounts.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }

    async fn tune_mount(&self, path: &str, config: &MountConfigInput) -> Result<(), VaultError> {
        self.begin()?;
        let (default, max) = parse_ttls(config)?;
        let key = mount_key(path);
        let mut mounts = self.mounts.write().await;
        let entry = mounts
            .get_mut(&key)
            .ok_or_else(|| bad_request(format!("no mount entry found at {key}")))?;
        entry.config.default_lease_ttl = default;
        entry.config.max_lease_ttl = max;
        Ok(())
    }

    async fn unmount(&self, path: &str) -> Result<(), VaultError> {
        self.begin()?;
        self.mounts.write().await.remove(&mount_key(path));
        Ok(())
    }
}
