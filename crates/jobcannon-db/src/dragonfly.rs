//! `Dragonfly` (Redis-compatible) blob backend.
//!
//! Each object is a plain string value at key `{bucket}:{key}`. Snapshots
//! are JSON, so values are required to be valid UTF-8.

use fred::prelude::*;

use crate::error::StorageError;

/// Connection handle to a `Dragonfly` (Redis-compatible) instance.
#[derive(Clone)]
pub struct DragonflyBlobStore {
    client: Client,
}

impl DragonflyBlobStore {
    /// Connect to `Dragonfly` at the given URL.
    ///
    /// The URL should follow the Redis URL scheme:
    /// `redis://host:port` or `redis://host:port/db`
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Config`] if the URL cannot be parsed.
    /// Returns [`StorageError::Dragonfly`] if the connection fails.
    pub async fn connect(url: &str) -> Result<Self, StorageError> {
        let config = Config::from_url(url)
            .map_err(|e| StorageError::Config(format!("Invalid Dragonfly URL: {e}")))?;

        let client = Builder::from_config(config).build()?;
        client.init().await?;

        tracing::info!("Connected to Dragonfly");
        Ok(Self { client })
    }

    pub(crate) async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        let value: Option<String> = self.client.get(object_key(bucket, key)).await?;
        value.map_or_else(
            || {
                Err(StorageError::NotFound {
                    bucket: bucket.to_owned(),
                    key: key.to_owned(),
                })
            },
            |s| Ok(s.into_bytes()),
        )
    }

    pub(crate) async fn put(
        &self,
        bucket: &str,
        key: &str,
        bytes: &[u8],
    ) -> Result<(), StorageError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| StorageError::Encoding(format!("blob is not UTF-8: {e}")))?;
        let _: () = self
            .client
            .set(object_key(bucket, key), text, None, None, false)
            .await?;
        Ok(())
    }

    /// Remove `bucket/key`. Missing objects are not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Dragonfly`] if the delete fails.
    pub async fn delete(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        let _: u32 = self.client.del(object_key(bucket, key)).await?;
        Ok(())
    }
}

fn object_key(bucket: &str, key: &str) -> String {
    format!("{bucket}:{key}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_key_joins_bucket_and_key() {
        assert_eq!(
            object_key("jobcannon", "previous_results.json"),
            "jobcannon:previous_results.json"
        );
    }
}
