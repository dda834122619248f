//! Analysis request types.

use archlens_core::types::RepoIdentity;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request payload for analyzing a repository.
///
/// # Example
///
/// ```json
/// {
///   "owner": "acme",
///   "name": "widgets",
///   "branch": "main",
///   "force": false
/// }
/// ```
#[must_use]
#[derive(Debug, Default, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAnalysis {
    /// Account or organization login (1-39 characters).
    #[validate(length(min = 1, max = 39))]
    pub owner: String,

    /// Repository name (1-100 characters).
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    /// Branch to download instead of the default one.
    #[validate(length(min = 1, max = 255))]
    pub branch: Option<String>,

    /// Skips the cached artifact and analyzes again.
    #[serde(default)]
    pub force: bool,
}

impl CreateAnalysis {
    /// Builds the validated repository identity.
    pub fn repo_identity(&self) -> archlens_core::Result<RepoIdentity> {
        let repo = RepoIdentity::new(self.owner.trim(), self.name.trim())?;
        match self.branch.as_deref().map(str::trim) {
            Some(branch) => repo.with_branch(branch),
            None => Ok(repo),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(owner: &str, name: &str) -> CreateAnalysis {
        CreateAnalysis {
            owner: owner.to_owned(),
            name: name.to_owned(),
            ..CreateAnalysis::default()
        }
    }

    #[test]
    fn builds_identity_with_branch() {
        let mut create = request("acme", "widgets");
        create.branch = Some("release/1.2".to_owned());

        let repo = create.repo_identity().unwrap();
        assert_eq!(repo.full_name(), "acme/widgets");
        assert_eq!(repo.branch.as_deref(), Some("release/1.2"));
    }

    #[test]
    fn rejects_malformed_identity() {
        assert!(request("acme", "widgets").validate().is_ok());
        assert!(request("", "widgets").validate().is_err());
        assert!(request("-acme", "widgets").repo_identity().is_err());
        assert!(request("acme", "..").repo_identity().is_err());
    }
}
