//! Review orchestration.
//!
//! Drives the per-file loop: prompt construction, provider chat, tolerant
//! parsing, aggregation. Files are reviewed strictly sequentially in
//! selection order; each chat is awaited before the next prompt is built,
//! and no state is shared across iterations.

use std::fmt;

use kestrel_core::{ChangedFile, KestrelError, ReviewComment};
use serde::Serialize;

use crate::prompt;
use crate::provider::{AiProvider, ChatMessage, Role};

/// Result of a completed review run.
///
/// # Examples
///
/// ```
/// use kestrel_review::pipeline::{ReviewRun, RunStats};
///
/// let run = ReviewRun {
///     comments: vec![],
///     stats: RunStats {
///         files_reviewed: 0,
///         comments_total: 0,
///         model_used: "gpt-4o".into(),
///     },
/// };
/// assert!(run.comments.is_empty());
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRun {
    /// Aggregated comments, in file-selection order.
    pub comments: Vec<ReviewComment>,
    /// Statistics about the run.
    pub stats: RunStats,
}

/// Statistics about a review run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStats {
    /// Number of files sent to the model.
    pub files_reviewed: usize,
    /// Total comments across all files.
    pub comments_total: usize,
    /// Model identifier used for the run.
    pub model_used: String,
}

/// Review orchestrator.
///
/// Holds the resolved provider and the per-run prompt inputs.
pub struct ReviewPipeline {
    provider: Box<dyn AiProvider>,
    model: String,
    custom_instructions: String,
}

impl ReviewPipeline {
    /// Create a pipeline from a resolved provider and run settings.
    pub fn new(
        provider: Box<dyn AiProvider>,
        model: impl Into<String>,
        custom_instructions: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            custom_instructions: custom_instructions.into(),
        }
    }

    /// Review the selected files one at a time and aggregate the comments.
    ///
    /// A malformed model reply contributes zero comments for its file; a
    /// provider failure aborts the whole run and discards anything gathered
    /// so far.
    ///
    /// # Errors
    ///
    /// Returns [`KestrelError::Provider`] if any chat call fails.
    pub async fn review(&self, files: &[ChangedFile]) -> Result<ReviewRun, KestrelError> {
        let mut comments = Vec::new();

        for file in files {
            let messages = vec![
                ChatMessage {
                    role: Role::System,
                    content: prompt::build_system_prompt(),
                },
                ChatMessage {
                    role: Role::User,
                    content: prompt::build_file_prompt(file, &self.custom_instructions),
                },
            ];

            let response = self.provider.chat(&messages, &self.model).await?;
            comments.extend(prompt::parse_review_response(&response, &file.filename));
        }

        Ok(ReviewRun {
            stats: RunStats {
                files_reviewed: files.len(),
                comments_total: comments.len(),
                model_used: self.model.clone(),
            },
            comments,
        })
    }
}

impl fmt::Display for ReviewRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Model: {} | Files: {} | Comments: {}\n",
            self.stats.model_used, self.stats.files_reviewed, self.stats.comments_total,
        )?;

        if self.comments.is_empty() {
            writeln!(f, "No issues found.")?;
        } else {
            for c in &self.comments {
                writeln!(f, "{}:{}", c.path, c.line)?;
                writeln!(f, "  {}", c.body.replace('\n', "\n  "))?;
                writeln!(f)?;
            }
        }

        Ok(())
    }
}
