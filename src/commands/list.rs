use crate::{config::StorageConfig, s3_client::S3Store};
use anyhow::Result;

pub async fn list_objects(
    prefix: Option<&str>,
    limit: Option<usize>,
    config: &StorageConfig,
    verbose: bool,
) -> Result<()> {
    if verbose {
        println!("📄 Listing objects in bucket {}", config.bucket);
        if let Some(p) = prefix {
            println!("  Prefix: {}", p);
        }
        if let Some(l) = limit {
            println!("  Limit: {}", l);
        }
    }

    let store = S3Store::connect(config).await;
    let objects = store.list(&config.bucket, prefix, limit).await?;

    if objects.is_empty() {
        println!("No objects found");
        return Ok(());
    }

    println!("Found {} object(s):", objects.len());
    for (i, object) in objects.iter().enumerate() {
        println!("{}. {} ({})", i + 1, object.key, format_size(object.size));
    }
    let total: u64 = objects.iter().map(|o| o.size).sum();
    println!("Total: {}", format_size(total));

    Ok(())
}

fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.2} {}", value, UNITS[unit])
    }
}
