use crate::error::UploadError;
use crate::models::{CredentialType, Credentials, Settings};
use anyhow::{Result, anyhow};
use bytes::Bytes;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Maps an application token to the destination settings for its uploads.
pub trait SettingsResolver: Send + Sync {
    fn resolve(&self, app_token: &str) -> Result<Settings, UploadError>;
}

/// Single-tenant resolver: every token routes to the same bucket and
/// Google credentials, loaded once at construction.
pub struct StaticSettingsResolver {
    bucket: String,
    raw_material: Bytes,
}

impl StaticSettingsResolver {
    pub fn new(raw_material: Bytes, bucket: String) -> Self {
        Self {
            bucket,
            raw_material,
        }
    }

    pub async fn from_file(credentials_file: &Path, bucket: String) -> Result<Self> {
        let raw_material = tokio::fs::read(credentials_file).await.map_err(|e| {
            anyhow!(
                "failed to read google credentials file {:?}: {}",
                credentials_file,
                e
            )
        })?;
        Ok(Self::new(Bytes::from(raw_material), bucket))
    }
}

impl SettingsResolver for StaticSettingsResolver {
    fn resolve(&self, _app_token: &str) -> Result<Settings, UploadError> {
        Ok(Settings {
            credentials: Credentials {
                kind: CredentialType::GoogleStorage.to_string(),
                bucket: self.bucket.clone(),
                raw_material: self.raw_material.clone(),
            },
        })
    }
}

#[derive(Debug, Deserialize)]
struct TenantEntry {
    #[serde(rename = "type")]
    kind: String,
    bucket: String,
    credentials_file: PathBuf,
}

/// Multi-tenant resolver backed by a JSON table keyed by application token:
///
/// ```json
/// {
///   "abcdefghijkl": {
///     "type": "googlestorage",
///     "bucket": "tenant-a",
///     "credentials_file": "tenant-a.json"
///   }
/// }
/// ```
///
/// Relative credential paths are taken from the table's directory. Every
/// credential file is read when the table is loaded. Type tags are kept
/// verbatim and checked by the uploader.
pub struct TenantTableResolver {
    tenants: HashMap<String, Credentials>,
}

impl TenantTableResolver {
    pub fn new(tenants: HashMap<String, Credentials>) -> Self {
        Self { tenants }
    }

    pub async fn from_file(table_file: &Path) -> Result<Self> {
        let raw = tokio::fs::read(table_file)
            .await
            .map_err(|e| anyhow!("failed to read tenant table {:?}: {}", table_file, e))?;
        let entries: HashMap<String, TenantEntry> = serde_json::from_slice(&raw)
            .map_err(|e| anyhow!("malformed tenant table {:?}: {}", table_file, e))?;

        let base_dir = table_file.parent().unwrap_or_else(|| Path::new(""));
        let mut tenants = HashMap::with_capacity(entries.len());

        for (token, entry) in entries {
            let path = base_dir.join(&entry.credentials_file);
            let raw_material = tokio::fs::read(&path).await.map_err(|e| {
                anyhow!(
                    "failed to read credentials file {:?} for {:?}: {}",
                    path,
                    token,
                    e
                )
            })?;

            tenants.insert(
                token,
                Credentials {
                    kind: entry.kind,
                    bucket: entry.bucket,
                    raw_material: Bytes::from(raw_material),
                },
            );
        }

        tracing::info!("Loaded {} tenants from {:?}", tenants.len(), table_file);
        Ok(Self::new(tenants))
    }
}

impl SettingsResolver for TenantTableResolver {
    fn resolve(&self, app_token: &str) -> Result<Settings, UploadError> {
        self.tenants
            .get(app_token)
            .map(|credentials| Settings {
                credentials: credentials.clone(),
            })
            .ok_or_else(|| UploadError::ResolutionFailed {
                token: app_token.to_string(),
                reason: "unknown application token".to_string(),
            })
    }
}
