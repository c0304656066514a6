//! On-disk state for the managed mount.
//!
//! The file holds at most one resource. A missing file reads as "nothing
//! recorded"; a resource whose identity was cleared by a refresh is stored
//! as `null` so the next apply creates it.

use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use vaultmount_core::schema::RESOURCE_TYPE;
use vaultmount_core::state::ResourceData;

const STATE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub struct StateFile {
    pub version: u32,
    pub resource_type: String,
    pub resource: Option<ResourceData>,
}

impl StateFile {
    pub fn new(resource: Option<ResourceData>) -> Self {
        Self {
            version: STATE_VERSION,
            resource_type: RESOURCE_TYPE.to_owned(),
            resource: resource.filter(ResourceData::is_present),
        }
    }

    /// The recorded resource, if any.
    pub fn current(&self) -> Option<&ResourceData> {
        self.resource.as_ref()
    }
}

pub async fn load(path: &Path) -> Result<StateFile> {
    let bytes = match tokio::fs::read(path).await {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(StateFile::new(None)),
        Err(e) => {
            return Err(e).with_context(|| format!("failed to read state file {}", path.display()));
        }
    };

    let state: StateFile = serde_json::from_slice(&bytes)
        .with_context(|| format!("failed to parse state file {}", path.display()))?;
    if state.version != STATE_VERSION {
        bail!(
            "unsupported state file version {} in {} (expected {STATE_VERSION})",
            state.version,
            path.display()
        );
    }
    if state.resource_type != RESOURCE_TYPE {
        bail!(
            "state file {} tracks '{}', not '{RESOURCE_TYPE}'",
            path.display(),
            state.resource_type
        );
    }
    Ok(state)
}

pub async fn save(path: &Path, state: &StateFile) -> Result<()> {
    let mut body = serde_json::to_vec_pretty(state).context("failed to serialize state")?;
    body.push(b'\n');

    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, &body)
        .await
        .with_context(|| format!("failed to write {}", tmp.display()))?;
    tokio::fs::rename(&tmp, path)
        .await
        .with_context(|| format!("failed to replace state file {}", path.display()))?;
    Ok(())
}

pub async fn remove(path: &Path) -> Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("failed to remove state file {}", path.display())),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> ResourceData {
        ResourceData {
            id: "ssh-test".to_owned(),
            path: "ssh-test".to_owned(),
            engine_type: "ssh".to_owned(),
            description: "test description".to_owned(),
            default_lease_ttl_seconds: 3600,
            max_lease_ttl_seconds: 86_400,
        }
    }

    #[tokio::test]
    async fn missing_file_is_empty_state() {
        let dir = tempfile::tempdir().unwrap();
        let state = load(&dir.path().join("nope.json")).await.unwrap();
        assert!(state.current().is_none());
    }

    #[tokio::test]
    async fn save_then_load_keeps_resource() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        save(&path, &StateFile::new(Some(sample()))).await.unwrap();

        let state = load(&path).await.unwrap();
        assert_eq!(state.current(), Some(&sample()));
    }

    #[test]
    fn cleared_identity_is_not_recorded() {
        let mut gone = sample();
        gone.clear_id();
        assert!(StateFile::new(Some(gone)).current().is_none());
    }

    #[tokio::test]
    async fn foreign_resource_type_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        tokio::fs::write(&path, r#"{"version":1,"resource_type":"vault_policy","resource":null}"#)
            .await
            .unwrap();
        assert!(load(&path).await.is_err());
    }

    #[tokio::test]
    async fn remove_tolerates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        remove(&dir.path().join("state.json")).await.unwrap();
    }
}
