// Bucket client for product images. Uploads decoded bytes under a path and
// returns the publicly resolvable URL for that object.

use reqwest::Client;
use thiserror::Error;

use crate::config::StorageConfig;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage upload failed with status {0}: {1}")]
    UploadFailed(reqwest::StatusCode, String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

pub struct StorageClient {
    config: StorageConfig,
    http_client: Client,
}

impl StorageClient {
    pub fn new(config: StorageConfig) -> Self {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self { config, http_client }
    }

    /// Upload `bytes` under `path` in the configured bucket, overwriting any
    /// previous object at that path. Returns the public URL.
    pub async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let url = format!(
            "{}/storage/v1/object/{}/{}",
            self.config.base_url, self.config.bucket, path
        );

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.config.service_key)
            .header("x-upsert", "true")
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::UploadFailed(status, body));
        }

        Ok(self.public_url(path))
    }

    pub fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.config.base_url, self.config.bucket, path
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> StorageConfig {
        StorageConfig {
            base_url: "https://cdn.example.com".to_string(),
            bucket: "product-images".to_string(),
            service_key: "secret".to_string(),
        }
    }

    #[test]
    fn public_url_points_into_the_bucket() {
        let client = StorageClient::new(test_config());
        assert_eq!(
            client.public_url("products/42-1700000000.jpg"),
            "https://cdn.example.com/storage/v1/object/public/product-images/products/42-1700000000.jpg"
        );
    }
}
