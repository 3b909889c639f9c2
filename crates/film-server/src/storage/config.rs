use serde::{Deserialize, Serialize};
use std::env;

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_BUCKET: &str = "film-files";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub endpoint: Option<String>,
    pub region: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub path_style: bool,
}

impl StorageConfig {
    /// Reads `S3_ENDPOINT`, `S3_REGION`, `S3_BUCKET`, `S3_ACCESS_KEY`,
    /// `S3_SECRET_KEY` and `S3_PATH_STYLE`; the AWS variables stand in for
    /// missing keys.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            endpoint: lookup("S3_ENDPOINT").filter(|e| !e.is_empty()),
            region: lookup("S3_REGION").unwrap_or_else(|| DEFAULT_REGION.to_string()),
            bucket: lookup("S3_BUCKET").unwrap_or_else(|| DEFAULT_BUCKET.to_string()),
            access_key: lookup("S3_ACCESS_KEY")
                .or_else(|| lookup("AWS_ACCESS_KEY_ID"))
                .unwrap_or_else(|| "minioadmin".to_string()),
            secret_key: lookup("S3_SECRET_KEY")
                .or_else(|| lookup("AWS_SECRET_ACCESS_KEY"))
                .unwrap_or_else(|| "minioadmin".to_string()),
            path_style: lookup("S3_PATH_STYLE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
        }
    }
}
