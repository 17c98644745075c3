//! Object storage access for event-triggered downloads.

use object_store::ObjectStore;
use object_store::aws::AmazonS3Builder;
use std::sync::Arc;

/// Build an S3 store for `bucket`.
///
/// Credentials, region and optional endpoint come from the standard `AWS_*` environment
/// variables, which also covers S3-compatible services such as MinIO.
pub fn s3_store(bucket: &str) -> Result<Arc<dyn ObjectStore>, object_store::Error> {
    let store = AmazonS3Builder::from_env()
        .with_bucket_name(bucket)
        .build()?;
    tracing::info!(bucket, "Initialized S3 object store");
    Ok(Arc::new(store))
}
