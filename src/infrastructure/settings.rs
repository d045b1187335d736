use crate::config::UploaderConfig;
use crate::services::settings::{SettingsResolver, StaticSettingsResolver, TenantTableResolver};
use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Builds the settings resolver once at startup.
///
/// A tenant table takes precedence; otherwise every token routes to the
/// configured bucket with the Google credentials file.
pub async fn setup_settings(
    credentials_file: &Path,
    tenants_file: Option<&Path>,
    config: &UploaderConfig,
) -> Result<Arc<dyn SettingsResolver>> {
    if let Some(tenants_file) = tenants_file {
        info!("🗂️  Tenant table: {:?}", tenants_file);
        let resolver = TenantTableResolver::from_file(tenants_file).await?;
        return Ok(Arc::new(resolver));
    }

    info!(
        "🔑 Credentials: {:?} (Bucket: {})",
        credentials_file, config.bucket
    );
    let resolver = StaticSettingsResolver::from_file(credentials_file, config.bucket.clone()).await?;
    Ok(Arc::new(resolver))
}
