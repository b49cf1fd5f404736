use crate::{config::StorageConfig, s3_client::S3Store};
use anyhow::Result;

pub async fn delete_object(key: &str, config: &StorageConfig, verbose: bool) -> Result<()> {
    let store = S3Store::connect(config).await;
    if verbose {
        println!("🗑️ Deleting {} from bucket {}", key, config.bucket);
    }

    store.delete(&config.bucket, key).await?;

    println!("✅ Deleted {}", key);
    Ok(())
}
