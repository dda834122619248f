//! In-memory extraction of repository tarballs.

use std::io::Read;
use std::path::{Component, Path};

use archlens_core::source::{SourceArchive, SourceFile};
use flate2::read::GzDecoder;

use crate::{Result, TRACING_TARGET_ARCHIVE};

/// Directories whose contents are never analyzed.
const SKIPPED_DIRS: &[&str] = &[
    ".git",
    "node_modules",
    "target",
    "dist",
    "build",
    "vendor",
    "__pycache__",
];

/// Prefix inspected for NUL bytes when detecting binary files.
const BINARY_SNIFF_BYTES: usize = 8 * 1024;

/// Size bounds applied while unpacking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveLimits {
    /// Files larger than this are skipped.
    pub max_file_bytes: u64,
    /// Extraction stops once kept contents would exceed this.
    pub max_total_bytes: u64,
}

impl Default for ArchiveLimits {
    fn default() -> Self {
        Self {
            max_file_bytes: 256 * 1024,
            max_total_bytes: 16 * 1024 * 1024,
        }
    }
}

/// Returns the path below the tarball's top-level directory, `/`-separated.
///
/// Entries with absolute or parent components are rejected.
fn relative_path(path: &Path) -> Option<String> {
    let mut parts = Vec::new();
    for component in path.components().skip(1) {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?),
            Component::CurDir => {}
            _ => return None,
        }
    }

    (!parts.is_empty()).then(|| parts.join("/"))
}

fn in_skipped_dir(relative: &str) -> bool {
    let mut segments = relative.split('/');
    segments.next_back();
    segments.any(|segment| SKIPPED_DIRS.contains(&segment))
}

fn is_binary(contents: &[u8]) -> bool {
    contents[..contents.len().min(BINARY_SNIFF_BYTES)].contains(&0)
}

/// Unpacks a gzip tarball into the text files it holds.
///
/// Runs synchronously; call it from a blocking task.
pub fn extract_archive(data: &[u8], limits: ArchiveLimits) -> Result<SourceArchive> {
    let mut archive = tar::Archive::new(GzDecoder::new(data));
    let mut source = SourceArchive::default();
    let mut total = 0u64;

    for entry in archive.entries()? {
        let mut entry = entry?;
        if !entry.header().entry_type().is_file() {
            continue;
        }

        let path = entry.path()?;
        let Some(relative) = relative_path(&path) else {
            continue;
        };

        if in_skipped_dir(&relative) {
            source.skipped += 1;
            continue;
        }

        let size = entry.size();
        if size > limits.max_file_bytes {
            tracing::trace!(target: TRACING_TARGET_ARCHIVE, path = %relative, size, "Skipping large file");
            source.skipped += 1;
            continue;
        }

        if total + size > limits.max_total_bytes {
            tracing::debug!(
                target: TRACING_TARGET_ARCHIVE,
                total,
                budget = limits.max_total_bytes,
                "Extraction budget spent"
            );
            source.skipped += 1;
            break;
        }

        let mut contents = Vec::with_capacity(size as usize);
        entry.read_to_end(&mut contents)?;

        if is_binary(&contents) {
            source.skipped += 1;
            continue;
        }

        total += size;
        source.files.push(SourceFile::new(
            relative,
            String::from_utf8_lossy(&contents).into_owned(),
        ));
    }

    tracing::debug!(
        target: TRACING_TARGET_ARCHIVE,
        files = source.files.len(),
        skipped = source.skipped,
        bytes = total,
        "Archive extracted"
    );

    Ok(source)
}

#[cfg(test)]
pub(crate) mod tests {
    use flate2::Compression;
    use flate2::write::GzEncoder;

    use super::*;

    /// Builds a GitHub-style tarball with every entry under `acme-widgets-abc123/`.
    pub(crate) fn tarball(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let encoder = GzEncoder::new(Vec::new(), Compression::default());
        let mut builder = tar::Builder::new(encoder);

        for (path, contents) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(contents.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, format!("acme-widgets-abc123/{path}"), *contents)
                .unwrap();
        }

        builder.into_inner().unwrap().finish().unwrap()
    }

    #[test]
    fn strips_the_top_level_directory() {
        let data = tarball(&[
            ("Cargo.toml", b"[package]"),
            ("src/main.rs", b"fn main() {}"),
        ]);

        let source = extract_archive(&data, ArchiveLimits::default()).unwrap();
        let paths: Vec<_> = source.files.iter().map(|file| file.path.as_str()).collect();

        assert_eq!(paths, vec!["Cargo.toml", "src/main.rs"]);
        assert_eq!(source.files[1].contents, "fn main() {}");
        assert_eq!(source.skipped, 0);
    }

    #[test]
    fn skips_vendored_binary_and_large_files() {
        let large = vec![b'a'; 64];
        let data = tarball(&[
            ("node_modules/left-pad/index.js", b"module.exports = 1"),
            ("web/dist/bundle.js", b"minified"),
            ("assets/logo.png", b"\x89PNG\x00\x01"),
            ("data/huge.csv", &large),
            ("src/build.rs", b"fn main() {}"),
        ]);

        let limits = ArchiveLimits {
            max_file_bytes: 32,
            ..ArchiveLimits::default()
        };
        let source = extract_archive(&data, limits).unwrap();

        assert_eq!(source.file_tree(), "src/build.rs");
        assert_eq!(source.skipped, 4);
    }

    #[test]
    fn stops_when_the_budget_is_spent() {
        let data = tarball(&[
            ("a.txt", b"0123456789"),
            ("b.txt", b"0123456789"),
            ("c.txt", b"0123456789"),
        ]);

        let limits = ArchiveLimits {
            max_file_bytes: 100,
            max_total_bytes: 25,
        };
        let source = extract_archive(&data, limits).unwrap();

        assert_eq!(source.file_tree(), "a.txt\nb.txt");
        assert_eq!(source.total_bytes(), 20);
    }

    #[test]
    fn rejects_garbage() {
        assert!(extract_archive(b"not a tarball", ArchiveLimits::default()).is_err());
    }

    #[test]
    fn relative_paths() {
        assert_eq!(
            relative_path(Path::new("repo-sha/src/lib.rs")).as_deref(),
            Some("src/lib.rs")
        );
        assert_eq!(relative_path(Path::new("repo-sha")), None);
        assert_eq!(relative_path(Path::new("repo-sha/../etc/passwd")), None);
        assert!(in_skipped_dir("a/node_modules/b.js"));
        assert!(!in_skipped_dir("src/target.rs"));
    }
}
