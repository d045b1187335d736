use crate::config::UploaderConfig;
use crate::error::UploadError;
use crate::models::{CredentialType, UploadJob, UploadReport};
use crate::services::credentials::CredentialMaterializer;
use crate::services::settings::SettingsResolver;
use crate::services::storage::ObjectWriter;
use crate::utils::validation::{object_name, parse_filename};
use bytes::Bytes;
use std::path::Path;
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

/// Uploads one file at a time: resolve its destination from the file name,
/// stream it, then commit or abort the remote object.
pub struct Uploader {
    settings: Arc<dyn SettingsResolver>,
    materializer: Arc<dyn CredentialMaterializer>,
    config: UploaderConfig,
}

impl Uploader {
    pub fn new(
        settings: Arc<dyn SettingsResolver>,
        materializer: Arc<dyn CredentialMaterializer>,
        config: UploaderConfig,
    ) -> Self {
        Self {
            settings,
            materializer,
            config,
        }
    }

    pub async fn upload(&self, path: &Path) -> Result<UploadReport, UploadError> {
        let job = self.prepare(path)?;
        self.execute(job).await
    }

    /// Validates the file name and resolves the settings for its token.
    pub fn prepare(&self, path: &Path) -> Result<UploadJob, UploadError> {
        let object_name = object_name(path)?;
        let parsed = parse_filename(&object_name)?;
        let settings = self.settings.resolve(&parsed.app_token)?;

        Ok(UploadJob {
            local_path: path.to_path_buf(),
            object_name,
            parsed,
            settings,
        })
    }

    pub async fn execute(&self, job: UploadJob) -> Result<UploadReport, UploadError> {
        if !job.parsed.compressed && self.config.format_policy.require_compression {
            return Err(UploadError::UnsupportedFormat(job.object_name));
        }

        let credentials = &job.settings.credentials;
        let kind: CredentialType = credentials
            .kind
            .parse()
            .map_err(UploadError::UnsupportedCredentialType)?;

        let storage = self.materializer.materialize(kind, credentials).await?;
        let bucket = storage.bucket().to_string();

        // The local file must be readable before any remote writer exists.
        let mut file = File::open(&job.local_path).await.map_err(|source| {
            UploadError::LocalFileUnreadable {
                path: job.local_path.clone(),
                source,
            }
        })?;

        let mut writer = storage
            .open_writer(&job.object_name)
            .await
            .map_err(|source| UploadError::TransferFailed {
                path: job.local_path.clone(),
                bucket: bucket.clone(),
                source,
            })?;

        let size_bytes =
            match copy_to_writer(&mut file, writer.as_mut(), self.config.chunk_size).await {
                Ok(n) => n,
                Err(source) => {
                    if let Err(e) = writer.abort().await {
                        tracing::warn!(
                            "Failed to abort upload of {} to {}: {}",
                            job.object_name,
                            bucket,
                            e
                        );
                    }
                    return Err(UploadError::TransferFailed {
                        path: job.local_path,
                        bucket,
                        source,
                    });
                }
            };

        writer
            .commit()
            .await
            .map_err(|source| UploadError::CommitFailed {
                object: job.object_name.clone(),
                bucket: bucket.clone(),
                source,
            })?;

        tracing::info!(
            "Uploaded {} to {} ({} bytes)",
            job.object_name,
            bucket,
            size_bytes
        );

        Ok(UploadReport {
            bucket,
            object_name: job.object_name,
            size_bytes,
        })
    }
}

async fn copy_to_writer(
    file: &mut File,
    writer: &mut dyn ObjectWriter,
    chunk_size: usize,
) -> anyhow::Result<u64> {
    let mut buffer = vec![0u8; chunk_size];
    let mut total_size = 0u64;

    loop {
        let n = file.read(&mut buffer).await?;
        if n == 0 {
            break;
        }
        writer.write(Bytes::copy_from_slice(&buffer[..n])).await?;
        total_size += n as u64;
    }

    Ok(total_size)
}
