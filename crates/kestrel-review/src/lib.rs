//! The Kestrel review pipeline.
//!
//! Provides the pieces the binary wires together: file selection,
//! provider clients, prompt construction, response parsing, review
//! orchestration, and the GitHub boundary.

pub mod github;
pub mod pattern;
pub mod pipeline;
pub mod prompt;
pub mod provider;
pub mod select;
