//! Backing-location metadata resolution.

use async_trait::async_trait;
use aws_sdk_s3::primitives::DateTime;
use tracing::debug;

use crate::error::ResolveError;

/// Looks up when a table's backing data was last modified.
#[async_trait]
pub trait MetadataResolver: Send + Sync {
    /// Epoch millis of the backing data, or `None` when it does not exist.
    async fn resolve(&self, location: &str) -> Result<Option<i64>, ResolveError>;
}

/// Resolves `s3://bucket/key` locations with `HeadObject`.
pub struct S3MetadataResolver {
    client: aws_sdk_s3::Client,
}

impl S3MetadataResolver {
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MetadataResolver for S3MetadataResolver {
    async fn resolve(&self, location: &str) -> Result<Option<i64>, ResolveError> {
        let (bucket, key) = parse_s3_location(location)?;

        match self.client.head_object().bucket(bucket).key(key).send().await {
            Ok(output) => Ok(output.last_modified().map(epoch_millis)),
            Err(err) => {
                let not_found = err
                    .as_service_error()
                    .map(|e| e.is_not_found())
                    .unwrap_or(false);
                if not_found {
                    debug!(location, "Backing data not found");
                    Ok(None)
                } else {
                    Err(ResolveError::AwsSdk(err.to_string()))
                }
            }
        }
    }
}

/// Split `s3://bucket/key` into `(bucket, key)`. The key is percent-decoded.
pub fn parse_s3_location(location: &str) -> Result<(String, String), ResolveError> {
    let invalid = || ResolveError::InvalidLocation(location.to_string());

    let parsed = url::Url::parse(location.trim()).map_err(|_| invalid())?;
    if parsed.scheme() != "s3" && parsed.scheme() != "s3a" {
        return Err(invalid());
    }

    let bucket = parsed.host_str().unwrap_or_default();
    let key = urlencoding::decode(parsed.path().trim_start_matches('/')).map_err(|_| invalid())?;

    if bucket.is_empty() || key.is_empty() {
        return Err(invalid());
    }
    Ok((bucket.to_string(), key.into_owned()))
}

fn epoch_millis(dt: &DateTime) -> i64 {
    dt.secs() * 1000 + i64::from(dt.subsec_nanos() / 1_000_000)
}
