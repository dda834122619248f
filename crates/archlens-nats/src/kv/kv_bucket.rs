//! Key-value bucket configuration traits.

/// Marker trait for KV bucket configuration.
pub trait KvBucket: Clone + Send + Sync + 'static {
    /// Bucket name used in NATS KV.
    const NAME: &'static str;

    /// Human-readable description for the bucket.
    const DESCRIPTION: &'static str;
}

/// Bucket for analysis job snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AnalysisStatusBucket;

impl KvBucket for AnalysisStatusBucket {
    const NAME: &'static str = "analysis_status";
    const DESCRIPTION: &'static str = "Analysis job progress snapshots";
}
