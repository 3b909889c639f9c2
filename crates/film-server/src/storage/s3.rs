//! S3-compatible blob store (AWS S3, MinIO)

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::{error::DisplayErrorContext, primitives::ByteStream, Client};
use axum::body::Bytes;
use futures::StreamExt;
use std::collections::HashMap;
use tokio_util::io::ReaderStream;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::config::StorageConfig;
use super::{film_prefix, new_key, Blob, BlobError, BlobInfo, BlobResult, BlobStore};

/// Object metadata key holding the hex SHA-256 of the content.
const CHECKSUM_METADATA: &str = "sha256";

#[derive(Clone)]
pub struct S3BlobStore {
    client: Client,
    bucket: String,
}

impl S3BlobStore {
    pub async fn new(config: StorageConfig) -> Self {
        debug!(
            endpoint = ?config.endpoint,
            region = %config.region,
            bucket = %config.bucket,
            "Initializing blob store"
        );

        let credentials = Credentials::new(
            &config.access_key,
            &config.secret_key,
            None,
            None,
            "film-storage",
        );

        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .load()
            .await;

        let mut builder =
            aws_sdk_s3::config::Builder::from(&shared).force_path_style(config.path_style);
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        info!("Blob store initialized for bucket: {}", config.bucket);

        Self::with_client(Client::from_conf(builder.build()), config.bucket)
    }

    pub fn with_client(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

fn s3_error(context: &str, err: impl std::error::Error) -> BlobError {
    BlobError::S3(format!("{}: {}", context, DisplayErrorContext(err)))
}

fn checksum_from_metadata(metadata: Option<&HashMap<String, String>>) -> Option<String> {
    metadata.and_then(|m| m.get(CHECKSUM_METADATA)).cloned()
}

#[async_trait]
impl BlobStore for S3BlobStore {
    #[instrument(skip(self, data), fields(size = data.len()))]
    async fn save(
        &self,
        film_id: Uuid,
        data: Bytes,
        content_type: Option<String>,
    ) -> BlobResult<BlobInfo> {
        let key = new_key(film_id);
        let checksum = film_common::checksum::sha256_hex(&data);
        let size = data.len() as i64;

        debug!("Uploading {} bytes to s3://{}/{}", size, self.bucket, key);

        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(data))
            .metadata(CHECKSUM_METADATA, &checksum);

        if let Some(ct) = &content_type {
            request = request.content_type(ct);
        }

        request
            .send()
            .await
            .map_err(|e| s3_error("Failed to upload to S3", e))?;

        info!("Successfully uploaded to s3://{}/{}", self.bucket, key);

        Ok(BlobInfo {
            key,
            size,
            content_type,
            checksum: Some(checksum),
        })
    }

    #[instrument(skip(self))]
    async fn list(&self, film_id: Uuid) -> BlobResult<Vec<BlobInfo>> {
        let prefix = film_prefix(film_id);

        let response = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(&prefix)
            .send()
            .await
            .map_err(|e| s3_error("Failed to list S3 objects", e))?;

        let mut blobs: Vec<BlobInfo> = response
            .contents()
            .iter()
            .filter_map(|obj| {
                obj.key().map(|key| BlobInfo {
                    key: key.to_string(),
                    size: obj.size().unwrap_or(0),
                    content_type: None,
                    checksum: None,
                })
            })
            .collect();
        blobs.sort_by(|a, b| a.key.cmp(&b.key));

        debug!(count = blobs.len(), "Listed s3://{}/{}", self.bucket, prefix);

        Ok(blobs)
    }

    #[instrument(skip(self))]
    async fn open(&self, key: &str) -> BlobResult<Blob> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| match e.into_service_error() {
                err if err.is_no_such_key() => BlobError::NotFound(key.to_string()),
                err => s3_error("Failed to download from S3", err),
            })?;

        let info = BlobInfo {
            key: key.to_string(),
            size: response.content_length().unwrap_or(0),
            content_type: response.content_type().map(str::to_string),
            checksum: checksum_from_metadata(response.metadata()),
        };

        let body = ReaderStream::new(response.body.into_async_read()).boxed();

        Ok(Blob { info, body })
    }

    #[instrument(skip(self))]
    async fn delete_all(&self, film_id: Uuid) -> BlobResult<usize> {
        let blobs = self.list(film_id).await?;

        for blob in &blobs {
            self.client
                .delete_object()
                .bucket(&self.bucket)
                .key(&blob.key)
                .send()
                .await
                .map_err(|e| s3_error("Failed to delete from S3", e))?;

            debug!("Deleted s3://{}/{}", self.bucket, blob.key);
        }

        Ok(blobs.len())
    }
}
