//! NATS Key-Value store operations.
//!
//! - `KvStore<K, V, B>`: type-safe key-value operations
//! - `KvKey`: key types rendered into NATS subjects
//! - `KvBucket`: bucket name and description
//! - `NatsStatusStore`: the job status capability on top of a `KvStore`

mod kv_bucket;
mod kv_key;
mod kv_store;
mod status_store;

pub use kv_bucket::{AnalysisStatusBucket, KvBucket};
pub use kv_key::{AnalysisKey, KvKey};
pub use kv_store::KvStore;
pub use status_store::NatsStatusStore;
