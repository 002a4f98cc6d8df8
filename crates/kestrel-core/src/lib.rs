//! Core types, configuration, and error handling for Kestrel.
//!
//! This crate provides the shared foundation used by the review crate and
//! the binary:
//! - [`KestrelError`] — unified error type using `thiserror`
//! - [`RunConfig`] / [`Credentials`] — layered run configuration
//! - Shared types: [`PullRequestFile`], [`ChangedFile`], [`FileStatus`],
//!   [`ReviewComment`], [`Side`], [`Verdict`]

mod config;
mod error;
mod types;

pub use config::{parse_exclude_patterns, Credentials, RunConfig};
pub use error::KestrelError;
pub use types::{ChangedFile, FileStatus, PullRequestFile, ReviewComment, Side, Verdict};

/// A convenience `Result` type for Kestrel operations.
pub type Result<T> = std::result::Result<T, KestrelError>;
