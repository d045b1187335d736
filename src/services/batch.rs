use crate::error::BatchError;
use crate::services::upload_service::Uploader;
use std::path::PathBuf;

/// Runs uploads strictly in input order and stops at the first failure.
///
/// Files uploaded before the failing one are not reported back; the per-file
/// log lines are the only record of progress.
pub struct BatchDriver {
    uploader: Uploader,
}

impl BatchDriver {
    pub fn new(uploader: Uploader) -> Self {
        Self { uploader }
    }

    pub async fn run(&self, files: &[PathBuf]) -> Result<(), BatchError> {
        if files.is_empty() {
            return Err(BatchError::NoFiles);
        }

        for path in files {
            tracing::info!("uploading file {:?}...", path);
            self.uploader
                .upload(path)
                .await
                .map_err(|source| BatchError::Upload {
                    path: path.clone(),
                    source,
                })?;
        }

        tracing::info!("Uploaded {} files", files.len());
        Ok(())
    }
}
