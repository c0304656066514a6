//! Lifecycle handlers for the `vault_secret_backend` resource.
//!
//! Each handler is a straight request/response exchange with Vault's
//! `sys/mounts` API. The only translation performed is trailing-slash
//! normalization of the mount path and rendering TTL seconds as `"<n>s"`.
//!
//! A mount missing on read is drift, not an error: the identity is cleared
//! so the next apply creates it again.

use tracing::{debug, info, warn};

use crate::client::SysMounts;
use crate::error::ResourceError;
use crate::schema::SecretBackendConfig;
use crate::state::{ResourceData, mount_key};
use crate::ttl::format_seconds;
use crate::types::{MountConfigInput, MountInput};

/// Result of an existence check.
///
/// When listing mounts fails, `exists` is `true` and `error` is set, so a
/// caller that ignores the error still does not drop the resource.
#[derive(Debug)]
pub struct ExistsOutcome {
    pub exists: bool,
    pub error: Option<ResourceError>,
}

/// Handlers for one secret-backend mount, bound to a Vault client.
#[derive(Debug, Clone)]
pub struct SecretBackend<C> {
    client: C,
}

fn mount_config_input(default_lease_ttl: i64, max_lease_ttl: i64) -> MountConfigInput {
    MountConfigInput {
        default_lease_ttl: format_seconds(default_lease_ttl),
        max_lease_ttl: format_seconds(max_lease_ttl),
    }
}

impl<C: SysMounts> SecretBackend<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Mount the backend and read back its server-computed attributes.
    ///
    /// Unset TTLs are sent as `"0s"`, which Vault treats as "use the system
    /// default"; the values Vault settles on are populated by the read.
    ///
    /// # Errors
    ///
    /// - [`ResourceError::Validation`] before any request if the
    ///   configuration is invalid.
    /// - [`ResourceError::Mount`] if Vault rejects the mount.
    /// - [`ResourceError::Read`] if the follow-up read fails.
    pub async fn create(&self, config: &SecretBackendConfig) -> Result<ResourceData, ResourceError> {
        config.validate()?;

        let engine_type = config.engine_type.as_str();
        let path = config.effective_path();

        debug!(engine_type, path, "mounting secret backend");
        let input = MountInput {
            engine_type: engine_type.to_owned(),
            description: config.effective_description().to_owned(),
            config: mount_config_input(
                config.default_lease_ttl_seconds.unwrap_or(0),
                config.max_lease_ttl_seconds.unwrap_or(0),
            ),
        };
        self.client
            .mount(path, &input)
            .await
            .map_err(|source| ResourceError::Mount {
                engine_type: engine_type.to_owned(),
                path: path.to_owned(),
                source,
            })?;
        debug!(engine_type, path, "mounted secret backend");

        let mut data = ResourceData::with_id(path);
        self.read(&mut data).await?;
        Ok(data)
    }

    /// Refresh `data` from Vault's mount table.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Read`] if listing mounts fails. A missing
    /// mount is not an error: the identity is cleared instead.
    pub async fn read(&self, data: &mut ResourceData) -> Result<(), ResourceError> {
        let path = data.id.clone();

        debug!(path = %path, "reading backend mount from Vault");
        let mounts = self
            .client
            .list_mounts()
            .await
            .map_err(|source| ResourceError::Read {
                path: path.clone(),
                source,
            })?;
        debug!(path = %path, "read backend mount from Vault");

        let Some(mount) = mounts.get(&mount_key(&path)) else {
            warn!(path = %path, "mount not found, removing backend from state");
            data.clear_id();
            return Ok(());
        };

        data.path = path;
        data.engine_type.clone_from(&mount.engine_type);
        data.description.clone_from(&mount.description);
        data.default_lease_ttl_seconds = mount.config.default_lease_ttl;
        data.max_lease_ttl_seconds = mount.config.max_lease_ttl;
        Ok(())
    }

    /// Tune the lease TTLs of an existing mount, then read it back.
    ///
    /// TTLs omitted from `config` keep the values recorded in `data`. Other
    /// attributes are never sent; changing them requires replacement.
    ///
    /// # Errors
    ///
    /// - [`ResourceError::Validation`] if the configuration is invalid.
    /// - [`ResourceError::Tune`] if Vault rejects the tune request.
    /// - [`ResourceError::Read`] if the follow-up read fails.
    pub async fn update(
        &self,
        data: &mut ResourceData,
        config: &SecretBackendConfig,
    ) -> Result<(), ResourceError> {
        config.validate()?;
        let path = data.id.clone();

        debug!(path = %path, "updating lease TTLs");
        let ttls = mount_config_input(
            config
                .default_lease_ttl_seconds
                .unwrap_or(data.default_lease_ttl_seconds),
            config
                .max_lease_ttl_seconds
                .unwrap_or(data.max_lease_ttl_seconds),
        );
        self.client
            .tune_mount(&path, &ttls)
            .await
            .map_err(|source| ResourceError::Tune {
                path: path.clone(),
                source,
            })?;
        debug!(path = %path, "updated lease TTLs");

        self.read(data).await
    }

    /// Unmount the backend.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Unmount`] on any failure; nothing is retried.
    pub async fn delete(&self, data: &ResourceData) -> Result<(), ResourceError> {
        let path = data.id.as_str();

        debug!(path, "unmounting secret backend");
        self.client
            .unmount(path)
            .await
            .map_err(|source| ResourceError::Unmount {
                path: path.to_owned(),
                source,
            })?;
        debug!(path, "unmounted secret backend");
        Ok(())
    }

    /// Check whether the mount identified by `data` is present in Vault.
    pub async fn exists(&self, data: &ResourceData) -> ExistsOutcome {
        let path = data.id.as_str();

        debug!(path, "checking if secret backend exists");
        match self.client.list_mounts().await {
            Ok(mounts) => {
                debug!(path, "checked if secret backend exists");
                ExistsOutcome {
                    exists: mounts.contains_key(&mount_key(path)),
                    error: None,
                }
            }
            Err(source) => ExistsOutcome {
                exists: true,
                error: Some(ResourceError::List { source }),
            },
        }
    }

    /// Rehydrate full state from a mount path alone.
    ///
    /// # Errors
    ///
    /// - [`ResourceError::Read`] if listing mounts fails.
    /// - [`ResourceError::ImportNotFound`] if Vault has no such mount.
    pub async fn import(&self, id: &str) -> Result<ResourceData, ResourceError> {
        let path = id.trim_end_matches('/');
        let mut data = ResourceData::with_id(path);
        self.read(&mut data).await?;
        if !data.is_present() {
            return Err(ResourceError::ImportNotFound {
                path: path.to_owned(),
            });
        }
        info!(path, engine_type = %data.engine_type, "imported secret backend");
        Ok(data)
    }
}
