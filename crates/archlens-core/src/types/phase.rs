use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Stage of the analysis job lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Serialize, Deserialize, AsRefStr, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Phase {
    /// Fetching the repository archive.
    Downloading,
    /// Unpacking the archive into source files.
    Extracting,
    /// Producing diagram and flows from the sources.
    Analyzing,
    /// Packaging and persisting the artifact.
    Generating,
    /// Finished, the artifact is attached.
    Complete,
    /// Failed, the status carries the message.
    Error,
}

impl Phase {
    /// Returns whether no further transitions are possible.
    #[inline]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Error)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn terminal_phases() {
        assert!(Phase::Complete.is_terminal());
        assert!(Phase::Error.is_terminal());
        assert!(!Phase::Analyzing.is_terminal());
    }

    #[test]
    fn wire_names() {
        assert_eq!(Phase::Downloading.as_ref(), "downloading");
        assert_eq!(Phase::from_str("generating").unwrap(), Phase::Generating);
        assert_eq!(
            serde_json::to_string(&Phase::Complete).unwrap(),
            "\"complete\""
        );
    }
}
