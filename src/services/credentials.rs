use crate::error::UploadError;
use crate::models::{CredentialType, Credentials};
use crate::services::storage::{ObjectStorage, ObjectStoreService, S3StorageService};
use anyhow::anyhow;
use async_trait::async_trait;
use aws_sdk_s3::config::Region;
use object_store::gcp::GoogleCloudStorageBuilder;
use serde::Deserialize;
use std::sync::Arc;

/// Turns stored credential material into a bucket-bound, read-write storage handle.
#[async_trait]
pub trait CredentialMaterializer: Send + Sync {
    async fn materialize(
        &self,
        kind: CredentialType,
        credentials: &Credentials,
    ) -> Result<Arc<dyn ObjectStorage>, UploadError>;
}

/// Access key document accepted for `s3` credentials.
#[derive(Debug, Deserialize)]
pub struct S3Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: String,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub force_path_style: bool,
}

/// Builds real cloud clients from credential material.
///
/// Google credentials must be a service-account key; the resulting client
/// authenticates with read-write storage scope. The clients are built with
/// their own HTTP stack and ignore any caller-supplied HTTP client.
pub struct CloudCredentialMaterializer {
    s3_part_size: usize,
}

impl CloudCredentialMaterializer {
    pub fn new(s3_part_size: usize) -> Self {
        Self { s3_part_size }
    }

    fn google_storage(&self, credentials: &Credentials) -> anyhow::Result<Arc<dyn ObjectStorage>> {
        let key = std::str::from_utf8(&credentials.raw_material)
            .map_err(|e| anyhow!("service account key is not valid UTF-8: {}", e))?;

        let store = GoogleCloudStorageBuilder::new()
            .with_bucket_name(&credentials.bucket)
            .with_service_account_key(key)
            .build()?;

        Ok(Arc::new(ObjectStoreService::new(
            Arc::new(store),
            credentials.bucket.clone(),
        )))
    }

    async fn amazon_s3(&self, credentials: &Credentials) -> anyhow::Result<Arc<dyn ObjectStorage>> {
        let s3: S3Credentials = serde_json::from_slice(&credentials.raw_material)
            .map_err(|e| anyhow!("malformed S3 credentials document: {}", e))?;

        let mut loader = aws_config::from_env()
            .region(Region::new(s3.region))
            .credentials_provider(aws_sdk_s3::config::Credentials::new(
                s3.access_key_id,
                s3.secret_access_key,
                None,
                None,
                "static",
            ));
        if let Some(endpoint) = &s3.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let aws_config = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&aws_config)
            .force_path_style(s3.force_path_style)
            .build();

        Ok(Arc::new(S3StorageService::new(
            aws_sdk_s3::Client::from_conf(s3_config),
            credentials.bucket.clone(),
            self.s3_part_size,
        )))
    }
}

#[async_trait]
impl CredentialMaterializer for CloudCredentialMaterializer {
    async fn materialize(
        &self,
        kind: CredentialType,
        credentials: &Credentials,
    ) -> Result<Arc<dyn ObjectStorage>, UploadError> {
        let storage = match kind {
            CredentialType::GoogleStorage => self.google_storage(credentials),
            CredentialType::AmazonS3 => self.amazon_s3(credentials).await,
        };

        storage.map_err(|source| UploadError::CredentialsInvalid {
            kind: kind.to_string(),
            bucket: credentials.bucket.clone(),
            source,
        })
    }
}
