#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod archive;
mod client;
mod config;
mod error;

pub use archive::{ArchiveLimits, extract_archive};
pub use client::GithubClient;
pub use config::GithubConfig;
pub use error::{Error, Result};

/// Tracing target for GitHub API calls.
pub const TRACING_TARGET_CLIENT: &str = "archlens_github::client";

/// Tracing target for archive extraction.
pub const TRACING_TARGET_ARCHIVE: &str = "archlens_github::archive";
