use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single file's upload. Every variant is terminal for that file.
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("file name {0:?} does not match the pattern")]
    InvalidFilename(String),

    #[error("could not get settings for {token:?}: {reason}")]
    ResolutionFailed { token: String, reason: String },

    #[error("unknown credentials type: {0}")]
    UnsupportedCredentialType(String),

    #[error("could not read {kind} credentials for bucket {bucket:?}: {source}")]
    CredentialsInvalid {
        kind: String,
        bucket: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("could not open local file {path:?}: {source}")]
    LocalFileUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("skip non-gzip file {0:?}")]
    UnsupportedFormat(String),

    #[error("could not upload file {path:?} to bucket {bucket:?}: {source}")]
    TransferFailed {
        path: PathBuf,
        bucket: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("could not commit object {object:?} in bucket {bucket:?}: {source}")]
    CommitFailed {
        object: String,
        bucket: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Failure of a whole batch run.
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("no file to run")]
    NoFiles,

    #[error("failed uploading file {path:?}: {source}")]
    Upload {
        path: PathBuf,
        #[source]
        source: UploadError,
    },
}
