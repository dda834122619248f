//! Prompt construction from extracted repository sources.

use std::fmt::Write;

use archlens_core::source::{SourceArchive, SourceFile};
use archlens_core::types::RepoIdentity;

/// System preamble describing the expected answer.
pub const PREAMBLE: &str = "\
You are a software architect who explains codebases with animated diagrams.
Given the file tree and selected files of a repository, describe its architecture
as a Mermaid flowchart and two to four flows that walk through it.

Answer with a single JSON object and nothing else:
{
  \"diagram\": \"graph TD ...\",
  \"flows\": [
    {
      \"name\": \"...\",
      \"description\": \"...\",
      \"steps\": [
        {\"step\": 1, \"node\": \"...\", \"message\": \"...\", \"duration\": 2500, \"request\": \"...\", \"response\": \"...\"}
      ]
    }
  ]
}

Rules:
- Number steps 1, 2, 3, ... within each flow without gaps.
- Each step's node must be the leading words of a node label in the diagram.
- Declare edges in the order the first flow traverses them.
- duration is in milliseconds, between 1500 and 5000.
- request and response are optional literal examples (an HTTP request line, a query, a payload).";

const PROMPT: &str = "\
Analyze the repository below and answer with the JSON object described above.";

/// Largest slice of a single file included in the prompt.
const FILE_EXCERPT_BYTES: usize = 8 * 1024;

/// Manifests and documents that describe a project as a whole.
const MANIFESTS: &[&str] = &[
    "readme.md",
    "readme",
    "cargo.toml",
    "package.json",
    "go.mod",
    "pyproject.toml",
    "requirements.txt",
    "pom.xml",
    "build.gradle",
    "gemfile",
    "docker-compose.yml",
    "docker-compose.yaml",
    "dockerfile",
];

/// File stems that usually hold entry points and wiring.
const ENTRY_STEMS: &[&str] = &[
    "main", "index", "app", "server", "lib", "routes", "router", "api", "handler", "handlers",
];

/// Ranks a file for inclusion; lower is sent first.
fn priority(file: &SourceFile) -> u8 {
    let path = file.path.to_ascii_lowercase();
    let depth = path.matches('/').count();
    let file_name = path.rsplit('/').next().unwrap_or(&path);
    let stem = file_name.split('.').next().unwrap_or(file_name);

    if MANIFESTS.contains(&file_name) {
        return if depth == 0 { 0 } else { 2 };
    }
    if path.contains("test") || path.starts_with("docs/") || path.contains("/docs/") {
        return 6;
    }
    if ENTRY_STEMS.contains(&stem) {
        return if depth <= 2 { 1 } else { 3 };
    }
    4 + u8::from(depth > 3)
}

/// Returns the longest prefix of `text` within `limit` bytes that ends on a
/// character boundary.
fn excerpt(text: &str, limit: usize) -> &str {
    if text.len() <= limit {
        return text;
    }

    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Digest of a repository sized to fit a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDigest {
    /// Prompt text.
    pub text: String,
    /// Files whose contents were included, fully or in part.
    pub included: usize,
    /// Files listed in the tree only.
    pub omitted: usize,
}

impl SourceDigest {
    /// Builds the digest, spending at most `budget` bytes on file contents.
    ///
    /// The full file tree is always listed. Contents follow in priority order
    /// (top-level manifests, entry points, remaining sources, tests and docs).
    pub fn build(repo: &RepoIdentity, source: &SourceArchive, budget: usize) -> Self {
        let mut text = String::new();
        let _ = writeln!(text, "{PROMPT}\n");
        let _ = writeln!(text, "Repository: {}", repo.full_name());
        if let Some(branch) = &repo.branch {
            let _ = writeln!(text, "Branch: {branch}");
        }

        let _ = writeln!(text, "\nFile tree:\n{}", source.file_tree());

        let mut ranked: Vec<&SourceFile> = source.files.iter().collect();
        ranked.sort_by(|a, b| priority(a).cmp(&priority(b)).then_with(|| a.path.cmp(&b.path)));

        let mut remaining = budget;
        let mut included = 0;
        for file in ranked {
            if remaining == 0 {
                break;
            }

            let body = excerpt(&file.contents, FILE_EXCERPT_BYTES.min(remaining));
            if body.trim().is_empty() {
                continue;
            }

            let _ = writeln!(text, "\n--- {} ---\n{}", file.path, body);
            if body.len() < file.contents.len() {
                let _ = writeln!(text, "[truncated]");
            }

            remaining -= body.len();
            included += 1;
        }

        Self {
            text,
            included,
            omitted: source.files.len() - included,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn archive() -> SourceArchive {
        SourceArchive {
            files: vec![
                SourceFile::new("tests/api.rs", "#[test] fn api() {}"),
                SourceFile::new("src/util/strings.rs", "pub fn pad() {}"),
                SourceFile::new("src/main.rs", "fn main() { serve(); }"),
                SourceFile::new("Cargo.toml", "[package]\nname = \"widgets\""),
            ],
            skipped: 0,
        }
    }

    fn repo() -> RepoIdentity {
        RepoIdentity::new("acme", "widgets").unwrap()
    }

    #[test]
    fn manifests_and_entry_points_come_first() {
        let digest = SourceDigest::build(&repo(), &archive(), 10_000);
        let manifest = digest.text.find("--- Cargo.toml ---").unwrap();
        let main = digest.text.find("--- src/main.rs ---").unwrap();
        let util = digest.text.find("--- src/util/strings.rs ---").unwrap();
        let test = digest.text.find("--- tests/api.rs ---").unwrap();

        assert!(manifest < main && main < util && util < test);
        assert_eq!(digest.included, 4);
        assert_eq!(digest.omitted, 0);
        assert!(digest.text.contains("Repository: acme/widgets"));
    }

    #[test]
    fn budget_limits_contents_but_not_the_tree() {
        let digest = SourceDigest::build(&repo(), &archive(), 30);

        assert!(digest.text.contains("tests/api.rs"));
        assert!(!digest.text.contains("--- tests/api.rs ---"));
        assert!(digest.text.contains("[truncated]"));
        assert_eq!(digest.included, 2);
        assert_eq!(digest.omitted, 2);
    }

    #[test]
    fn excerpts_respect_char_boundaries() {
        assert_eq!(excerpt("héllo", 2), "h");
        assert_eq!(excerpt("abc", 10), "abc");
    }
}
