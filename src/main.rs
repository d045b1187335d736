use clap::Parser;
use csv_uploader::config::UploaderConfig;
use csv_uploader::infrastructure::{settings, storage};
use csv_uploader::{BatchDriver, Uploader};
use dotenvy::dotenv;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to Google Application Credentials json
    #[arg(long, default_value = "gcloud/application_default_credentials.json")]
    google_creds: PathBuf,

    /// JSON table mapping app tokens to buckets and credentials (overrides --google-creds)
    #[arg(long)]
    tenants: Option<PathBuf>,

    /// Files to upload, processed in order
    files: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "csv_uploader=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    if args.files.is_empty() {
        return Err(csv_uploader::BatchError::NoFiles.into());
    }

    let config = UploaderConfig::from_env();
    info!(
        "🚀 Uploading {} files (require gzip: {})",
        args.files.len(),
        config.format_policy.require_compression
    );

    let settings =
        settings::setup_settings(&args.google_creds, args.tenants.as_deref(), &config).await?;
    let materializer = storage::setup_storage(&config);

    let driver = BatchDriver::new(Uploader::new(settings, materializer, config));
    driver.run(&args.files).await?;

    info!("✅ Done");
    Ok(())
}
