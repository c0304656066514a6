//! Vault `sys/mounts` client.
//!
//! [`SysMounts`] is the seam the lifecycle handlers talk to. [`VaultClient`]
//! implements it over HTTP. Requests are sent exactly once: no retries and
//! no backoff, so a failure surfaces to the caller immediately.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::VaultError;
use crate::types::{ApiErrorBody, MountConfigInput, MountInput, MountOutput};

/// Mount management operations of Vault's `sys` backend.
#[async_trait]
pub trait SysMounts: Send + Sync {
    /// Mount a secret engine at `path`.
    async fn mount(&self, path: &str, input: &MountInput) -> Result<(), VaultError>;

    /// List all mounts, keyed by path with a trailing slash.
    async fn list_mounts(&self) -> Result<HashMap<String, MountOutput>, VaultError>;

    /// Update the lease TTLs of the mount at `path`.
    async fn tune_mount(&self, path: &str, config: &MountConfigInput) -> Result<(), VaultError>;

    /// Unmount the secret engine at `path`.
    async fn unmount(&self, path: &str) -> Result<(), VaultError>;
}

/// HTTP implementation of [`SysMounts`].
#[derive(Debug, Clone)]
pub struct VaultClient {
    http: reqwest::Client,
    addr: String,
    token: String,
    namespace: Option<String>,
}

impl VaultClient {
    fn user_agent() -> String {
        format!("vaultmount/{}", env!("CARGO_PKG_VERSION"))
    }

    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Config`] if the token is empty or the address is
    /// not an `http://` / `https://` URL, and [`VaultError::Network`] if the
    /// HTTP client cannot be constructed.
    pub fn new(config: &ClientConfig) -> Result<Self, VaultError> {
        if config.token.is_empty() {
            return Err(VaultError::Config(
                "missing token — set VAULT_TOKEN or pass --token".to_owned(),
            ));
        }
        let addr = config.addr.trim_end_matches('/');
        if !(addr.starts_with("http://") || addr.starts_with("https://")) {
            return Err(VaultError::Config(format!(
                "invalid address '{}': expected an http:// or https:// URL",
                config.addr
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(Self::user_agent())
            .build()?;

        Ok(Self {
            http,
            addr: addr.to_owned(),
            token: config.token.clone(),
            namespace: config.namespace.clone(),
        })
    }

    /// Server address this client talks to, without a trailing slash.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{path}", self.addr)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<reqwest::Response, VaultError> {
        let mut req = self
            .http
            .request(method, self.url(path))
            .header("X-Vault-Token", &self.token)
            .header("X-Vault-Request", "true");
        if let Some(ns) = &self.namespace {
            req = req.header("X-Vault-Namespace", ns);
        }
        if let Some(b) = body {
            req = req.json(&b);
        }

        let resp = req.send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let text = resp.text().await.unwrap_or_default();
        let mut errors = serde_json::from_str::<ApiErrorBody>(&text)
            .map(|b| b.errors)
            .unwrap_or_default();
        if errors.is_empty() {
            errors.push(format!("HTTP {}", status.as_u16()));
        }

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(VaultError::PermissionDenied { errors });
        }
        Err(VaultError::Api {
            status: status.as_u16(),
            errors,
        })
    }
}

/// Percent-encode each segment of a mount path, dropping outer slashes.
fn encode_mount_path(path: &str) -> String {
    path.trim_matches('/')
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Extract the mount table from a `GET sys/mounts` body.
///
/// Current servers wrap the table in `data`; older ones return it at the
/// top level next to response metadata such as `request_id`.
fn parse_mount_table(body: Value) -> Result<HashMap<String, MountOutput>, VaultError> {
    let Value::Object(mut top) = body else {
        return Err(VaultError::Decode("mount list is not a JSON object".to_owned()));
    };
    let table = match top.remove("data") {
        Some(Value::Object(data)) => data,
        _ => top,
    };

    let mut mounts = HashMap::with_capacity(table.len());
    for (path, entry) in table {
        if !entry.get("type").is_some_and(Value::is_string) {
            continue;
        }
        let mount: MountOutput = serde_json::from_value(entry)?;
        mounts.insert(path, mount);
    }
    Ok(mounts)
}

#[async_trait]
impl SysMounts for VaultClient {
    async fn mount(&self, path: &str, input: &MountInput) -> Result<(), VaultError> {
        let body = serde_json::to_value(input)?;
        self.send(
            Method::POST,
            &format!("sys/mounts/{}", encode_mount_path(path)),
            Some(body),
        )
        .await?;
        Ok(())
    }

    async fn list_mounts(&self) -> Result<HashMap<String, MountOutput>, VaultError> {
        let resp = self.send(Method::GET, "sys/mounts", None).await?;
        let body: Value = resp.json().await?;
        parse_mount_table(body)
    }

    async fn tune_mount(&self, path: &str, config: &MountConfigInput) -> Result<(), VaultError> {
        let body = serde_json::to_value(config)?;
        self.send(
            Method::POST,
            &format!("sys/mounts/{}/tune", encode_mount_path(path)),
            Some(body),
        )
        .await?;
        Ok(())
    }

    async fn unmount(&self, path: &str) -> Result<(), VaultError> {
        self.send(
            Method::DELETE,
            &format!("sys/mounts/{}", encode_mount_path(path)),
            None,
        )
        .await?;
        Ok(())
    }
}
