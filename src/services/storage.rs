use anyhow::{Result, anyhow};
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use bytes::{Bytes, BytesMut};
use crate::config::MIN_S3_PART_SIZE;
use object_store::path::Path;
use object_store::{ObjectStore, WriteMultipart};
use std::sync::Arc;

/// Parts the object_store writer may keep in flight before `write` waits.
const MAX_IN_FLIGHT_PARTS: usize = 4;

/// A buffered write stream to one remote object.
///
/// Nothing becomes visible until [`commit`](ObjectWriter::commit) returns `Ok`.
/// `commit` and `abort` consume the writer, so a committed writer cannot be
/// aborted and vice versa. `abort` is safe to call after a failed `write`.
/// A failed `commit` discards the pending upload itself.
///
/// ```compile_fail
/// # use csv_uploader::services::storage::ObjectWriter;
/// async fn finish(writer: Box<dyn ObjectWriter>) -> anyhow::Result<()> {
///     writer.commit().await?;
///     // `writer` was moved by `commit`.
///     writer.abort().await
/// }
/// ```
#[async_trait]
pub trait ObjectWriter: Send {
    async fn write(&mut self, chunk: Bytes) -> Result<()>;
    async fn commit(self: Box<Self>) -> Result<()>;
    async fn abort(self: Box<Self>) -> Result<()>;
}

/// An authenticated handle on a single bucket.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    fn bucket(&self) -> &str;
    async fn open_writer(&self, object_name: &str) -> Result<Box<dyn ObjectWriter>>;
}

/// Storage backed by any `object_store` implementation (GCS in production).
pub struct ObjectStoreService {
    store: Arc<dyn ObjectStore>,
    bucket: String,
}

impl ObjectStoreService {
    pub fn new(store: Arc<dyn ObjectStore>, bucket: String) -> Self {
        Self { store, bucket }
    }
}

#[async_trait]
impl ObjectStorage for ObjectStoreService {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn open_writer(&self, object_name: &str) -> Result<Box<dyn ObjectWriter>> {
        let path = Path::from(object_name);
        let upload = self.store.put_multipart(&path).await?;
        tracing::debug!("Opened multipart upload for {}/{}", self.bucket, path);
        Ok(Box::new(ObjectStoreWriter {
            inner: WriteMultipart::new(upload),
        }))
    }
}

struct ObjectStoreWriter {
    inner: WriteMultipart,
}

#[async_trait]
impl ObjectWriter for ObjectStoreWriter {
    async fn write(&mut self, chunk: Bytes) -> Result<()> {
        // Surfaces errors from parts already in flight.
        self.inner.wait_for_capacity(MAX_IN_FLIGHT_PARTS).await?;
        self.inner.put(chunk);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.inner.finish().await?;
        Ok(())
    }

    async fn abort(self: Box<Self>) -> Result<()> {
        self.inner.abort().await?;
        Ok(())
    }
}

/// Storage backed by an S3-compatible endpoint using multipart uploads.
pub struct S3StorageService {
    client: Client,
    bucket: String,
    part_size: usize,
}

impl S3StorageService {
    /// `part_size` is raised to [`MIN_S3_PART_SIZE`], the smallest non-final
    /// part S3 accepts.
    pub fn new(client: Client, bucket: String, part_size: usize) -> Self {
        Self {
            client,
            bucket,
            part_size: part_size.max(MIN_S3_PART_SIZE),
        }
    }
}

#[async_trait]
impl ObjectStorage for S3StorageService {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn open_writer(&self, object_name: &str) -> Result<Box<dyn ObjectWriter>> {
        let multipart_upload_res = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(object_name)
            .send()
            .await?;

        let upload_id = multipart_upload_res
            .upload_id()
            .ok_or_else(|| anyhow!("No upload ID"))?
            .to_string();

        let session = S3MultipartSession {
            client: self.client.clone(),
            bucket: self.bucket.clone(),
            key: object_name.to_string(),
            upload_id,
        };
        Ok(Box::new(S3ObjectWriter::new(Box::new(session), self.part_size)))
    }
}

/// The remote half of one open multipart upload.
#[async_trait]
trait MultipartSession: Send + Sync {
    fn key(&self) -> &str;
    async fn upload_part(&self, part_number: i32, body: Bytes) -> Result<CompletedPart>;
    async fn complete(&self, parts: Vec<CompletedPart>) -> Result<()>;
    async fn abort(&self) -> Result<()>;
}

struct S3MultipartSession {
    client: Client,
    bucket: String,
    key: String,
    upload_id: String,
}

#[async_trait]
impl MultipartSession for S3MultipartSession {
    fn key(&self) -> &str {
        &self.key
    }

    async fn upload_part(&self, part_number: i32, body: Bytes) -> Result<CompletedPart> {
        let upload_part_res = self
            .client
            .upload_part()
            .bucket(&self.bucket)
            .key(&self.key)
            .upload_id(&self.upload_id)
            .body(ByteStream::from(body))
            .part_number(part_number)
            .send()
            .await?;

        Ok(CompletedPart::builder()
            .e_tag(upload_part_res.e_tag().unwrap_or_default())
            .part_number(part_number)
            .build())
    }

    async fn complete(&self, parts: Vec<CompletedPart>) -> Result<()> {
        let completed_multipart_upload = CompletedMultipartUpload::builder()
            .set_parts(Some(parts))
            .build();

        self.client
            .complete_multipart_upload()
            .bucket(&self.bucket)
            .key(&self.key)
            .upload_id(&self.upload_id)
            .multipart_upload(completed_multipart_upload)
            .send()
            .await?;
        Ok(())
    }

    async fn abort(&self) -> Result<()> {
        self.client
            .abort_multipart_upload()
            .bucket(&self.bucket)
            .key(&self.key)
            .upload_id(&self.upload_id)
            .send()
            .await?;
        Ok(())
    }
}

struct S3ObjectWriter {
    session: Box<dyn MultipartSession>,
    part_size: usize,
    buffer: BytesMut,
    completed_parts: Vec<CompletedPart>,
    chunk_index: i32,
}

impl S3ObjectWriter {
    fn new(session: Box<dyn MultipartSession>, part_size: usize) -> Self {
        Self {
            session,
            part_size,
            buffer: BytesMut::with_capacity(part_size),
            completed_parts: Vec::new(),
            chunk_index: 1,
        }
    }

    async fn upload_part(&mut self, body: Bytes) -> Result<()> {
        let part = self.session.upload_part(self.chunk_index, body).await?;
        self.completed_parts.push(part);
        tracing::debug!("Uploaded part {} of {}", self.chunk_index, self.session.key());

        self.chunk_index += 1;
        Ok(())
    }

    async fn finish(&mut self) -> Result<()> {
        // An empty object still needs one (empty) part.
        if !self.buffer.is_empty() || self.completed_parts.is_empty() {
            let last = self.buffer.split().freeze();
            self.upload_part(last).await?;
        }
        self.session
            .complete(std::mem::take(&mut self.completed_parts))
            .await
    }
}

#[async_trait]
impl ObjectWriter for S3ObjectWriter {
    async fn write(&mut self, chunk: Bytes) -> Result<()> {
        self.buffer.extend_from_slice(&chunk);
        while self.buffer.len() >= self.part_size {
            let part = self.buffer.split_to(self.part_size).freeze();
            self.upload_part(part).await?;
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let mut this = self;
        if let Err(e) = this.finish().await {
            // The caller has no writer left to abort with.
            if let Err(abort_err) = this.session.abort().await {
                tracing::warn!(
                    "Failed to abort multipart upload of {}: {}",
                    this.session.key(),
                    abort_err
                );
            }
            return Err(e);
        }
        Ok(())
    }

    async fn abort(self: Box<Self>) -> Result<()> {
        self.session.abort().await
    }
}
