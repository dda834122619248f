//! Repository identity and cache keys.

use std::fmt;

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Maximum length of a GitHub account or organization name.
pub const MAX_OWNER_LENGTH: usize = 39;

/// Maximum length of a repository name.
pub const MAX_NAME_LENGTH: usize = 100;

/// Maximum length of a branch hint.
pub const MAX_BRANCH_LENGTH: usize = 255;

/// Identity of a GitHub repository, with an optional branch hint used at
/// download time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoIdentity {
    /// Account or organization owning the repository.
    pub owner: String,
    /// Repository name.
    pub name: String,
    /// Branch to download instead of the default branch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

impl RepoIdentity {
    /// Creates a validated identity from an owner and a repository name.
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Result<Self> {
        let identity = Self {
            owner: owner.into().trim().to_owned(),
            name: name.into().trim().to_owned(),
            branch: None,
        };

        identity.validate()?;
        Ok(identity)
    }

    /// Attaches a branch hint, validating it.
    pub fn with_branch(mut self, branch: impl Into<String>) -> Result<Self> {
        let branch = branch.into();
        validate_branch(&branch)?;
        self.branch = Some(branch);
        Ok(self)
    }

    /// Checks the owner, name and branch hint against GitHub naming rules.
    pub fn validate(&self) -> Result<()> {
        validate_owner(&self.owner)?;
        validate_name(&self.name)?;
        if let Some(branch) = &self.branch {
            validate_branch(branch)?;
        }

        Ok(())
    }

    /// Returns `owner/name`.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// Returns the result cache key for this repository.
    ///
    /// Branch hints do not participate: there is one artifact per repository.
    pub fn cache_key(&self) -> CacheKey {
        CacheKey(format!(
            "{}/{}",
            self.owner.to_ascii_lowercase(),
            self.name.to_ascii_lowercase()
        ))
    }
}

impl fmt::Display for RepoIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.branch {
            Some(branch) => write!(f, "{}/{}@{}", self.owner, self.name, branch),
            None => write!(f, "{}/{}", self.owner, self.name),
        }
    }
}

/// Deterministic key of a cached artifact, `owner/name` in lower case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Returns the key as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Splits the key back into its owner and name segments.
    pub fn segments(&self) -> (&str, &str) {
        self.0.split_once('/').unwrap_or((self.0.as_str(), ""))
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn invalid(message: impl Into<String>) -> Error {
    Error::invalid_input().with_message(message)
}

fn validate_owner(owner: &str) -> Result<()> {
    if owner.is_empty() {
        return Err(invalid("repository owner must not be empty"));
    }
    if owner.len() > MAX_OWNER_LENGTH {
        return Err(invalid(format!(
            "repository owner must be at most {MAX_OWNER_LENGTH} characters"
        )));
    }
    if !owner.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(invalid(
            "repository owner may only contain alphanumeric characters or hyphens",
        ));
    }
    if owner.starts_with('-') || owner.ends_with('-') || owner.contains("--") {
        return Err(invalid(
            "repository owner cannot begin or end with a hyphen or contain consecutive hyphens",
        ));
    }

    Ok(())
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(invalid("repository name must not be empty"));
    }
    if name.len() > MAX_NAME_LENGTH {
        return Err(invalid(format!(
            "repository name must be at most {MAX_NAME_LENGTH} characters"
        )));
    }
    if name == "." || name == ".." {
        return Err(invalid("repository name is reserved"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
    {
        return Err(invalid(
            "repository name may only contain alphanumeric characters, '.', '-' or '_'",
        ));
    }

    Ok(())
}

fn validate_branch(branch: &str) -> Result<()> {
    if branch.is_empty() || branch.len() > MAX_BRANCH_LENGTH {
        return Err(invalid(format!(
            "branch must be between 1 and {MAX_BRANCH_LENGTH} characters"
        )));
    }
    if branch.contains("..") || branch.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(invalid("branch contains invalid characters"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn accepts_common_identities() {
        let repo = RepoIdentity::new("acme", "widgets").unwrap();
        assert_eq!(repo.full_name(), "acme/widgets");
        assert!(RepoIdentity::new("rust-lang", "rust.vim").is_ok());
        assert!(RepoIdentity::new("a", "b_c-d.e").is_ok());
    }

    #[test]
    fn trims_surrounding_whitespace() {
        let repo = RepoIdentity::new("  acme ", " widgets\n").unwrap();
        assert_eq!(repo.owner, "acme");
        assert_eq!(repo.name, "widgets");
    }

    #[test]
    fn rejects_bad_owners() {
        let long = "a".repeat(40);
        for owner in ["", "-acme", "acme-", "ac--me", "ac me", "acme/x", long.as_str()] {
            let error = RepoIdentity::new(owner, "widgets").unwrap_err();
            assert_eq!(error.kind, ErrorKind::InvalidInput, "owner {owner:?}");
        }
    }

    #[test]
    fn rejects_bad_names() {
        let long = "n".repeat(101);
        for name in ["", ".", "..", "wid gets", "wid/gets", long.as_str()] {
            assert!(RepoIdentity::new("acme", name).is_err(), "name {name:?}");
        }
    }

    #[test]
    fn branch_hint() {
        let repo = RepoIdentity::new("acme", "widgets")
            .unwrap()
            .with_branch("release/1.x")
            .unwrap();
        assert_eq!(repo.to_string(), "acme/widgets@release/1.x");

        let base = RepoIdentity::new("acme", "widgets").unwrap();
        assert!(base.clone().with_branch("").is_err());
        assert!(base.clone().with_branch("a..b").is_err());
        assert!(base.with_branch("has space").is_err());
    }

    #[test]
    fn cache_key_ignores_case_and_branch() {
        let upper = RepoIdentity::new("Acme", "Widgets").unwrap();
        let branched = RepoIdentity::new("acme", "widgets")
            .unwrap()
            .with_branch("dev")
            .unwrap();

        assert_eq!(upper.cache_key(), branched.cache_key());
        assert_eq!(upper.cache_key().as_str(), "acme/widgets");
        assert_eq!(upper.cache_key().segments(), ("acme", "widgets"));
    }

    #[test]
    fn deserializes_camel_case() {
        let repo: RepoIdentity =
            serde_json::from_str(r#"{"owner":"acme","name":"widgets"}"#).unwrap();
        assert_eq!(repo.branch, None);
        assert_eq!(
            serde_json::to_value(&repo).unwrap(),
            serde_json::json!({"owner": "acme", "name": "widgets"})
        );
    }
}
