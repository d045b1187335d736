#![allow(dead_code)]

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use bytes::Bytes;
use csv_uploader::UploadError;
use csv_uploader::config::UploaderConfig;
use csv_uploader::models::{CredentialType, Credentials};
use csv_uploader::services::credentials::CredentialMaterializer;
use csv_uploader::services::settings::StaticSettingsResolver;
use csv_uploader::services::storage::{ObjectStorage, ObjectWriter};
use csv_uploader::Uploader;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub const BUCKET: &str = "backend_test";
pub const GZ_NAME: &str =
    "abcdefghijkl_2024-01-01T00:00:00_0123456789abcdef0123456789abcdef.csv.gz";
pub const CSV_NAME: &str = "abcdefghijkl_2024-01-01T00:00:00_0123456789abcdef0123456789abcdef.csv";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Materialize { kind: CredentialType, bucket: String },
    Open { object: String },
    Write { object: String, len: usize },
    Commit { object: String },
    Abort { object: String },
}

/// How the fake store misbehaves.
#[derive(Debug, Clone, Copy, Default)]
pub struct Faults {
    pub reject_credentials: bool,
    pub fail_open: bool,
    /// Number of successful writes before every further write fails.
    pub fail_write_after: Option<usize>,
    pub fail_commit: bool,
}

/// Records every call made through the storage capability and keeps
/// committed objects in memory.
#[derive(Default)]
pub struct Recorder {
    calls: Mutex<Vec<Call>>,
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl Recorder {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| matches(c)).count()
    }

    pub fn opens(&self) -> usize {
        self.count(|c| matches!(c, Call::Open { .. }))
    }

    pub fn commits(&self) -> usize {
        self.count(|c| matches!(c, Call::Commit { .. }))
    }

    pub fn aborts(&self) -> usize {
        self.count(|c| matches!(c, Call::Abort { .. }))
    }

    pub fn object(&self, name: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(name).cloned()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

pub struct FakeMaterializer {
    pub recorder: Arc<Recorder>,
    pub faults: Faults,
}

#[async_trait]
impl CredentialMaterializer for FakeMaterializer {
    async fn materialize(
        &self,
        kind: CredentialType,
        credentials: &Credentials,
    ) -> Result<Arc<dyn ObjectStorage>, UploadError> {
        self.recorder.record(Call::Materialize {
            kind,
            bucket: credentials.bucket.clone(),
        });
        if self.faults.reject_credentials {
            return Err(UploadError::CredentialsInvalid {
                kind: kind.to_string(),
                bucket: credentials.bucket.clone(),
                source: anyhow!("invalid_grant: key expired"),
            });
        }
        Ok(Arc::new(FakeStore {
            bucket: credentials.bucket.clone(),
            recorder: self.recorder.clone(),
            faults: self.faults,
        }))
    }
}

struct FakeStore {
    bucket: String,
    recorder: Arc<Recorder>,
    faults: Faults,
}

#[async_trait]
impl ObjectStorage for FakeStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn open_writer(&self, object_name: &str) -> Result<Box<dyn ObjectWriter>> {
        self.recorder.record(Call::Open {
            object: object_name.to_string(),
        });
        if self.faults.fail_open {
            return Err(anyhow!("403 Forbidden"));
        }
        Ok(Box::new(FakeWriter {
            object: object_name.to_string(),
            recorder: self.recorder.clone(),
            faults: self.faults,
            buffer: Vec::new(),
            writes: 0,
        }))
    }
}

struct FakeWriter {
    object: String,
    recorder: Arc<Recorder>,
    faults: Faults,
    buffer: Vec<u8>,
    writes: usize,
}

#[async_trait]
impl ObjectWriter for FakeWriter {
    async fn write(&mut self, chunk: Bytes) -> Result<()> {
        if let Some(limit) = self.faults.fail_write_after {
            if self.writes >= limit {
                return Err(anyhow!("connection reset by peer"));
            }
        }
        self.recorder.record(Call::Write {
            object: self.object.clone(),
            len: chunk.len(),
        });
        self.buffer.extend_from_slice(&chunk);
        self.writes += 1;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.recorder.record(Call::Commit {
            object: self.object.clone(),
        });
        if self.faults.fail_commit {
            return Err(anyhow!("503 Service Unavailable"));
        }
        self.recorder
            .objects
            .lock()
            .unwrap()
            .insert(self.object.clone(), self.buffer.clone());
        Ok(())
    }

    async fn abort(self: Box<Self>) -> Result<()> {
        self.recorder.record(Call::Abort {
            object: self.object.clone(),
        });
        Ok(())
    }
}

pub fn small_chunks() -> UploaderConfig {
    UploaderConfig {
        chunk_size: 4,
        ..UploaderConfig::default()
    }
}

pub fn uploader(faults: Faults, config: UploaderConfig) -> (Uploader, Arc<Recorder>) {
    let recorder = Arc::new(Recorder::default());
    let settings = StaticSettingsResolver::new(
        Bytes::from_static(br#"{"type": "service_account"}"#),
        BUCKET.to_string(),
    );
    let materializer = FakeMaterializer {
        recorder: recorder.clone(),
        faults,
    };
    let uploader = Uploader::new(Arc::new(settings), Arc::new(materializer), config);
    (uploader, recorder)
}

pub fn write_file(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}
