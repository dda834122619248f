//! Repository source acquisition.

use bytes::Bytes;

use crate::Result;
use crate::types::RepoIdentity;

/// A text file extracted from a repository archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path relative to the repository root, `/`-separated.
    pub path: String,
    /// UTF-8 contents (lossy for invalid sequences).
    pub contents: String,
}

impl SourceFile {
    /// Creates a new source file.
    pub fn new(path: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }

    /// Returns the size of the contents in bytes.
    #[inline]
    pub fn size(&self) -> usize {
        self.contents.len()
    }
}

/// The readable part of a repository after extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceArchive {
    /// Extracted text files, in archive order.
    pub files: Vec<SourceFile>,
    /// Entries skipped because they were binary, too large or vendored.
    pub skipped: usize,
}

impl SourceArchive {
    /// Returns whether no file was extracted.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Returns the total size of the extracted contents.
    pub fn total_bytes(&self) -> usize {
        self.files.iter().map(SourceFile::size).sum()
    }

    /// Returns the extracted paths, one per line.
    pub fn file_tree(&self) -> String {
        self.files
            .iter()
            .map(|file| file.path.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Downloads and unpacks repository sources.
///
/// The two halves are separate so callers can report progress between them.
#[async_trait::async_trait]
pub trait SourceFetcher: Send + Sync + 'static {
    /// Downloads the compressed repository archive.
    async fn download(&self, repo: &RepoIdentity) -> Result<Bytes>;

    /// Unpacks an archive produced by [`SourceFetcher::download`].
    async fn extract(&self, archive: Bytes) -> Result<SourceArchive>;
}
