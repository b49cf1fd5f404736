use async_trait::async_trait;

use crate::api_client::ApiClient;
use crate::error::CallError;
use crate::s3_client::S3Store;

/// Something able to remove a stored object.
///
/// The cleanup run does not care whether removal happens through the
/// management API or directly against the bucket.
#[async_trait]
pub trait ObjectRemover: Send + Sync {
    fn name(&self) -> &'static str;

    async fn remove(&self, bucket: &str, key: &str) -> Result<(), CallError>;
}

/// Delegates removal to the management API's delete endpoint.
pub struct ApiRemover {
    api: ApiClient,
    endpoint: String,
}

impl ApiRemover {
    pub fn new(api: ApiClient, endpoint: impl Into<String>) -> Self {
        ApiRemover {
            api,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl ObjectRemover for ApiRemover {
    fn name(&self) -> &'static str {
        "api"
    }

    async fn remove(&self, bucket: &str, key: &str) -> Result<(), CallError> {
        self.api.delete_object(&self.endpoint, bucket, key).await
    }
}

/// Deletes straight from the bucket.
pub struct StorageRemover {
    store: S3Store,
}

impl StorageRemover {
    pub fn new(store: S3Store) -> Self {
        StorageRemover { store }
    }
}

#[async_trait]
impl ObjectRemover for StorageRemover {
    fn name(&self) -> &'static str {
        "storage"
    }

    async fn remove(&self, bucket: &str, key: &str) -> Result<(), CallError> {
        if key.trim().is_empty() {
            return Err(CallError::InvalidArgument("key name"));
        }
        self.store.delete(bucket, key).await
    }
}
