use std::env;

/// Bucket the single-tenant resolver routes every upload to.
pub const DEFAULT_BUCKET: &str = "backend_test";

/// Acceptance policy for the compression suffix of an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatPolicy {
    /// Reject plain `.csv` uploads (default: true)
    pub require_compression: bool,
}

impl Default for FormatPolicy {
    fn default() -> Self {
        Self {
            require_compression: true,
        }
    }
}

/// Runtime configuration for the uploader
#[derive(Debug, Clone)]
pub struct UploaderConfig {
    /// Bucket used by the static resolver (default: "backend_test")
    pub bucket: String,

    /// Local read size per write call in bytes (default: 1 MB)
    pub chunk_size: usize,

    /// Multipart part size for S3 destinations in bytes (default: 8 MB, minimum 5 MB)
    pub s3_part_size: usize,

    pub format_policy: FormatPolicy,
}

/// S3 rejects non-final parts smaller than this.
pub const MIN_S3_PART_SIZE: usize = 5 * 1024 * 1024;

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            bucket: DEFAULT_BUCKET.to_string(),
            chunk_size: 1024 * 1024,      // 1 MB
            s3_part_size: 8 * 1024 * 1024, // 8 MB
            format_policy: FormatPolicy::default(),
        }
    }
}

impl UploaderConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let default = Self::default();

        Self {
            bucket: lookup("UPLOAD_BUCKET")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(default.bucket),

            chunk_size: lookup("UPLOAD_CHUNK_SIZE")
                .and_then(|v| v.parse().ok())
                .filter(|&n: &usize| n > 0)
                .unwrap_or(default.chunk_size),

            s3_part_size: lookup("UPLOAD_S3_PART_SIZE")
                .and_then(|v| v.parse().ok())
                .map(|n: usize| n.max(MIN_S3_PART_SIZE))
                .unwrap_or(default.s3_part_size),

            format_policy: FormatPolicy {
                require_compression: !lookup("UPLOAD_ALLOW_UNCOMPRESSED")
                    .map(|v| v.to_lowercase() == "true" || v == "1")
                    .unwrap_or(false),
            },
        }
    }
}
