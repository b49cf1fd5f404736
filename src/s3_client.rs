use aws_config::SdkConfig;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::Client;

use crate::config::StorageConfig;
use crate::error::CallError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
    pub size: u64,
}

/// Direct access to the bucket, bypassing the management API.
#[derive(Debug, Clone)]
pub struct S3Store {
    client: Client,
}

impl S3Store {
    pub async fn connect(config: &StorageConfig) -> Self {
        tracing::debug!(region = %config.region, endpoint = ?config.endpoint, "Creating S3 client");

        let mut loader = aws_config::ConfigLoader::default().region(Region::new(config.region.clone()));

        // Without explicit keys the default provider chain (env, profile, IMDS) applies.
        if let (Some(access_key), Some(secret_key)) = (&config.access_key, &config.secret_key) {
            let credentials = Credentials::new(access_key.clone(), secret_key.clone(), None, None, "custom");
            loader = loader.credentials_provider(credentials);
        }

        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config: SdkConfig = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config).behavior_version_latest();
        if config.endpoint.is_some() {
            // S3-compatible stores generally do not support virtual-hosted buckets.
            builder = builder.force_path_style(true);
        }

        S3Store {
            client: Client::from_conf(builder.build()),
        }
    }

    pub async fn delete(&self, bucket: &str, key: &str) -> Result<(), CallError> {
        tracing::debug!(bucket, key, "Deleting object from storage");

        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| CallError::Storage(DisplayErrorContext(e).to_string()))?;

        Ok(())
    }

    /// Lists objects under `prefix`, following continuation tokens until
    /// the listing is exhausted or `limit` objects were collected.
    pub async fn list(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<StoredObject>, CallError> {
        let mut objects = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .list_objects_v2()
                .bucket(bucket)
                .set_continuation_token(continuation_token.take());
            if let Some(prefix) = prefix {
                request = request.prefix(prefix);
            }

            let response = request
                .send()
                .await
                .map_err(|e| CallError::Storage(DisplayErrorContext(e).to_string()))?;

            for object in response.contents() {
                if limit.is_some_and(|limit| objects.len() >= limit) {
                    return Ok(objects);
                }
                objects.push(StoredObject {
                    key: object.key().unwrap_or_default().to_string(),
                    size: u64::try_from(object.size().unwrap_or(0)).unwrap_or(0),
                });
            }
            if limit.is_some_and(|limit| objects.len() >= limit) {
                break;
            }

            match response.next_continuation_token() {
                Some(token) if response.is_truncated().unwrap_or(false) => {
                    continuation_token = Some(token.to_string());
                }
                _ => break,
            }
        }

        Ok(objects)
    }
}
