//! Key-value key types and traits.

use std::fmt;
use std::str::FromStr;

use archlens_core::types::AnalysisId;
use uuid::Uuid;

use crate::Error;

/// Marker trait for KV key types.
///
/// The `Display` form is the key written to NATS; it must be a valid
/// subject token.
pub trait KvKey: fmt::Debug + fmt::Display + FromStr + Clone + Send + Sync + 'static {}

/// Key of an analysis job snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnalysisKey(pub Uuid);

impl KvKey for AnalysisKey {}

impl fmt::Display for AnalysisKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AnalysisKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = Uuid::parse_str(s)
            .map_err(|e| Error::operation("parse_analysis_key", e.to_string()))?;
        Ok(Self(id))
    }
}

impl From<AnalysisId> for AnalysisKey {
    fn from(id: AnalysisId) -> Self {
        Self(id.into())
    }
}

impl From<&AnalysisId> for AnalysisKey {
    fn from(id: &AnalysisId) -> Self {
        Self(**id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_key_roundtrip() {
        let id = AnalysisId::new_v7();
        let key = AnalysisKey::from(&id);
        let parsed: AnalysisKey = key.to_string().parse().unwrap();
        assert_eq!(key, parsed);
        assert_eq!(key.to_string(), id.to_string());
    }

    #[test]
    fn test_invalid_key() {
        assert!("acme/widgets".parse::<AnalysisKey>().is_err());
    }
}
