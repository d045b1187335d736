use bytes::Bytes;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Credential type tag understood by the materializer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialType {
    /// Google Cloud Storage service-account JSON
    GoogleStorage,
    /// S3-compatible access key document
    AmazonS3,
}

impl CredentialType {
    pub const GOOGLE_STORAGE_TAG: &'static str = "googlestorage";
    pub const AMAZON_S3_TAG: &'static str = "s3";

    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialType::GoogleStorage => Self::GOOGLE_STORAGE_TAG,
            CredentialType::AmazonS3 => Self::AMAZON_S3_TAG,
        }
    }
}

impl fmt::Display for CredentialType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CredentialType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            Self::GOOGLE_STORAGE_TAG => Ok(CredentialType::GoogleStorage),
            Self::AMAZON_S3_TAG => Ok(CredentialType::AmazonS3),
            other => Err(other.to_string()),
        }
    }
}

/// Destination credentials for one tenant.
///
/// `kind` is kept as the raw tag handed out by the resolver; the upload
/// pipeline parses it into a [`CredentialType`] before anything touches
/// `raw_material`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub kind: String,
    pub bucket: String,
    pub raw_material: Bytes,
}

// Keeps key material out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("kind", &self.kind)
            .field("bucket", &self.bucket)
            .field("raw_material", &format_args!("<{} bytes>", self.raw_material.len()))
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub credentials: Credentials,
}

/// Components of a file name that follows the upload naming convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFilename {
    pub app_token: String,
    pub timestamp: String,
    pub content_hash: String,
    pub compressed: bool,
}

impl ParsedFilename {
    /// Rebuilds the file name these components were parsed from.
    pub fn file_name(&self) -> String {
        format!(
            "{}_{}_{}.csv{}",
            self.app_token,
            self.timestamp,
            self.content_hash,
            if self.compressed { ".gz" } else { "" }
        )
    }
}

/// Everything one upload needs, derived from a local path.
#[derive(Debug, Clone)]
pub struct UploadJob {
    pub local_path: PathBuf,
    pub object_name: String,
    pub parsed: ParsedFilename,
    pub settings: Settings,
}

/// Outcome of a committed upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReport {
    pub bucket: String,
    pub object_name: String,
    pub size_bytes: u64,
}
