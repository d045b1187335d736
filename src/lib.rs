pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;

pub use error::{BatchError, UploadError};
pub use services::batch::BatchDriver;
pub use services::upload_service::Uploader;
