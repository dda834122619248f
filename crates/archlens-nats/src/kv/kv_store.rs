//! Typed JSON records in a JetStream KV bucket.

use std::marker::PhantomData;
use std::time::Duration;

use async_nats::jetstream::{self, kv};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::{KvBucket, KvKey};
use crate::{Error, Result, TRACING_TARGET_KV};

/// Bucket of `V` records addressed by `K`.
///
/// Each key keeps a single revision; the bucket's `max_age` expires records
/// on the server.
pub struct KvStore<K, V, B> {
    store: kv::Store,
    _marker: PhantomData<fn() -> (K, V, B)>,
}

impl<K, V, B> Clone for KvStore<K, V, B> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _marker: PhantomData,
        }
    }
}

impl<K, V, B> KvStore<K, V, B>
where
    K: KvKey,
    V: Serialize + DeserializeOwned + Send + Sync + 'static,
    B: KvBucket,
{
    /// Binds to the bucket, creating it with `ttl` retention if missing.
    ///
    /// An existing bucket keeps the retention it was created with.
    #[tracing::instrument(skip(jetstream), target = TRACING_TARGET_KV)]
    pub(crate) async fn open(jetstream: &jetstream::Context, ttl: Duration) -> Result<Self> {
        if ttl.is_zero() {
            return Err(Error::invalid_config("bucket retention must be positive"));
        }

        let store = match jetstream.get_key_value(B::NAME).await {
            Ok(store) => {
                tracing::debug!(target: TRACING_TARGET_KV, bucket = B::NAME, "Using existing KV bucket");
                store
            }
            Err(_) => {
                tracing::info!(
                    target: TRACING_TARGET_KV,
                    bucket = B::NAME,
                    ttl_secs = ttl.as_secs(),
                    "Creating KV bucket"
                );

                jetstream
                    .create_key_value(kv::Config {
                        bucket: B::NAME.to_owned(),
                        description: B::DESCRIPTION.to_owned(),
                        max_age: ttl,
                        history: 1,
                        ..Default::default()
                    })
                    .await
                    .map_err(|e| Error::operation("kv_create", e.to_string()))?
            }
        };

        Ok(Self {
            store,
            _marker: PhantomData,
        })
    }

    /// Returns the bucket name.
    #[inline]
    pub fn bucket_name(&self) -> &'static str {
        B::NAME
    }

    /// Overwrites the record at `key`, returning the new revision.
    #[tracing::instrument(skip(self, value), target = TRACING_TARGET_KV)]
    pub async fn put(&self, key: &K, value: &V) -> Result<u64> {
        let subject = key.to_string();
        let document = serde_json::to_vec(value)?;
        let size_bytes = document.len();

        let revision = self
            .store
            .put(&subject, document.into())
            .await
            .map_err(|e| Error::operation("kv_put", e.to_string()))?;

        tracing::trace!(
            target: TRACING_TARGET_KV,
            key = %subject,
            revision,
            size_bytes,
            "Stored record"
        );

        Ok(revision)
    }

    /// Reads the record at `key`; expired and purged keys read as `None`.
    #[tracing::instrument(skip(self), target = TRACING_TARGET_KV)]
    pub async fn get(&self, key: &K) -> Result<Option<V>> {
        let subject = key.to_string();
        let entry = self
            .store
            .entry(&subject)
            .await
            .map_err(|e| Error::operation("kv_get", e.to_string()))?;

        // deletes and purges leave tombstones
        match entry {
            Some(entry) if matches!(entry.operation, kv::Operation::Put) => {
                Ok(Some(serde_json::from_slice(&entry.value)?))
            }
            _ => Ok(None),
        }
    }
}
