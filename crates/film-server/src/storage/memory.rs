//! In-process blob store for development and tests

use async_trait::async_trait;
use axum::body::Bytes;
use futures::StreamExt;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{film_prefix, new_key, Blob, BlobError, BlobInfo, BlobResult, BlobStore};

#[derive(Debug, Clone)]
struct StoredBlob {
    info: BlobInfo,
    data: Bytes,
}

#[derive(Default)]
pub struct InMemoryBlobStore {
    blobs: RwLock<BTreeMap<String, StoredBlob>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn save(
        &self,
        film_id: Uuid,
        data: Bytes,
        content_type: Option<String>,
    ) -> BlobResult<BlobInfo> {
        let info = BlobInfo {
            key: new_key(film_id),
            size: data.len() as i64,
            content_type,
            checksum: Some(film_common::checksum::sha256_hex(&data)),
        };

        self.blobs.write().await.insert(
            info.key.clone(),
            StoredBlob {
                info: info.clone(),
                data,
            },
        );
        Ok(info)
    }

    async fn list(&self, film_id: Uuid) -> BlobResult<Vec<BlobInfo>> {
        let prefix = film_prefix(film_id);
        let blobs = self.blobs.read().await;
        Ok(blobs
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .map(|(_, blob)| blob.info.clone())
            .collect())
    }

    async fn open(&self, key: &str) -> BlobResult<Blob> {
        let blob = self
            .blobs
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| BlobError::NotFound(key.to_string()))?;

        if let Some(expected) = &blob.info.checksum {
            film_common::checksum::verify_sha256(&blob.data, expected).map_err(|e| {
                BlobError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
            })?;
        }

        let data = blob.data;
        Ok(Blob {
            info: blob.info,
            body: futures::stream::once(async move { Ok::<_, std::io::Error>(data) }).boxed(),
        })
    }

    async fn delete_all(&self, film_id: Uuid) -> BlobResult<usize> {
        let prefix = film_prefix(film_id);
        let mut blobs = self.blobs.write().await;
        let before = blobs.len();
        blobs.retain(|key, _| !key.starts_with(&prefix));
        Ok(before - blobs.len())
    }
}
