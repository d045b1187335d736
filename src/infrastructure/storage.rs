use crate::config::UploaderConfig;
use crate::services::credentials::{CloudCredentialMaterializer, CredentialMaterializer};
use std::sync::Arc;
use tracing::info;

pub fn setup_storage(config: &UploaderConfig) -> Arc<dyn CredentialMaterializer> {
    info!(
        "☁️  Storage clients: chunk={}KB, S3 part={}MB",
        config.chunk_size / 1024,
        config.s3_part_size / 1024 / 1024
    );
    Arc::new(CloudCredentialMaterializer::new(config.s3_part_size))
}
