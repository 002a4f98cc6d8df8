use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Status of a file in a pull request, as reported by GitHub.
///
/// # Examples
///
/// ```
/// use kestrel_core::FileStatus;
///
/// let status: FileStatus = serde_json::from_str("\"modified\"").unwrap();
/// assert_eq!(status, FileStatus::Modified);
/// assert_eq!(status.to_string(), "modified");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    /// File was created by the PR.
    Added,
    /// File was deleted by the PR.
    Removed,
    /// File content changed.
    Modified,
    /// File was renamed (the `filename` field carries the new path).
    Renamed,
    /// File was copied from another file.
    Copied,
    /// File changed in a way GitHub does not classify further.
    Changed,
    /// File appears in the PR but its content is unchanged.
    Unchanged,
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileStatus::Added => write!(f, "added"),
            FileStatus::Removed => write!(f, "removed"),
            FileStatus::Modified => write!(f, "modified"),
            FileStatus::Renamed => write!(f, "renamed"),
            FileStatus::Copied => write!(f, "copied"),
            FileStatus::Changed => write!(f, "changed"),
            FileStatus::Unchanged => write!(f, "unchanged"),
        }
    }
}

/// A raw item from the pull-request changed-files listing.
///
/// GitHub omits `patch` for binary files and for diffs too large to
/// represent. Fields the pipeline does not consume are not modeled.
///
/// # Examples
///
/// ```
/// use kestrel_core::{FileStatus, PullRequestFile};
///
/// let raw = r#"{"filename": "src/app.ts", "patch": "@@ +1 @@", "status": "modified"}"#;
/// let file: PullRequestFile = serde_json::from_str(raw).unwrap();
/// assert_eq!(file.filename, "src/app.ts");
/// assert_eq!(file.status, FileStatus::Modified);
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestFile {
    /// Path of the file relative to the repository root.
    pub filename: String,
    /// Unified diff text, when GitHub can represent one.
    #[serde(default)]
    pub patch: Option<String>,
    /// Change classification.
    pub status: FileStatus,
}

/// A selected, reviewable changed file.
///
/// Unlike [`PullRequestFile`], the patch is guaranteed present and non-empty.
///
/// # Examples
///
/// ```
/// use kestrel_core::{ChangedFile, FileStatus};
///
/// let file = ChangedFile {
///     filename: "src/auth.rs".into(),
///     patch: "@@ -1 +1 @@\n+let x = 1;".into(),
///     status: FileStatus::Modified,
/// };
/// assert!(!file.patch.is_empty());
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ChangedFile {
    /// Path of the file relative to the repository root.
    pub filename: String,
    /// Unified diff text for this file.
    pub patch: String,
    /// Change classification.
    pub status: FileStatus,
}

/// Which version of the file a review comment anchors to.
///
/// Kestrel only ever anchors to the new version, so [`Side::Right`] is the
/// only variant.
///
/// # Examples
///
/// ```
/// use kestrel_core::Side;
///
/// assert_eq!(serde_json::to_string(&Side::Right).unwrap(), "\"RIGHT\"");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// The new file version.
    #[default]
    Right,
}

/// A single inline review comment produced by the AI reviewer.
///
/// # Examples
///
/// ```
/// use kestrel_core::{ReviewComment, Side};
///
/// let comment = ReviewComment {
///     path: "src/app.ts".into(),
///     line: 1,
///     side: Side::Right,
///     body: "eval() is a security risk".into(),
/// };
/// assert_eq!(comment.line, 1);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewComment {
    /// Path of the file being commented on.
    pub path: String,
    /// Line number in the new version of the file (1-based).
    pub line: u64,
    /// File version the line number refers to.
    pub side: Side,
    /// Comment text, including the attribution header.
    pub body: String,
}

/// The review outcome submitted to GitHub.
///
/// # Examples
///
/// ```
/// use kestrel_core::Verdict;
///
/// assert_eq!(Verdict::Approve.as_event(), "APPROVE");
/// assert_eq!("request-changes".parse::<Verdict>().unwrap(), Verdict::RequestChanges);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Verdict {
    /// Approve the pull request.
    Approve,
    /// Leave comments without an approval decision.
    Comment,
    /// Request changes before merging.
    RequestChanges,
}

impl Verdict {
    /// The GitHub review event string for this verdict.
    pub fn as_event(self) -> &'static str {
        match self {
            Verdict::Approve => "APPROVE",
            Verdict::Comment => "COMMENT",
            Verdict::RequestChanges => "REQUEST_CHANGES",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Approve => write!(f, "approve"),
            Verdict::Comment => write!(f, "comment"),
            Verdict::RequestChanges => write!(f, "request-changes"),
        }
    }
}

impl FromStr for Verdict {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "approve" => Ok(Verdict::Approve),
            "comment" => Ok(Verdict::Comment),
            "request-changes" => Ok(Verdict::RequestChanges),
            other => Err(format!("unknown verdict: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_status_roundtrips_through_json() {
        let json = serde_json::to_string(&FileStatus::Removed).unwrap();
        assert_eq!(json, "\"removed\"");

        let parsed: FileStatus = serde_json::from_str("\"renamed\"").unwrap();
        assert_eq!(parsed, FileStatus::Renamed);
    }

    #[test]
    fn pull_request_file_without_patch() {
        let raw = r#"{"filename": "logo.png", "status": "added"}"#;
        let file: PullRequestFile = serde_json::from_str(raw).unwrap();
        assert!(file.patch.is_none());
    }

    #[test]
    fn pull_request_file_ignores_extra_fields() {
        let raw = r#"{
            "filename": "src/app.ts",
            "patch": "@@ +1 @@",
            "status": "modified",
            "additions": 10,
            "deletions": 2,
            "sha": "abc123"
        }"#;
        let file: PullRequestFile = serde_json::from_str(raw).unwrap();
        assert_eq!(file.filename, "src/app.ts");
    }

    #[test]
    fn side_serializes_uppercase() {
        let json = serde_json::to_value(Side::Right).unwrap();
        assert_eq!(json, "RIGHT");
    }

    #[test]
    fn review_comment_wire_shape() {
        let comment = ReviewComment {
            path: "src/db.rs".into(),
            line: 7,
            side: Side::Right,
            body: "SQL injection risk".into(),
        };
        let json = serde_json::to_value(&comment).unwrap();
        assert_eq!(json["path"], "src/db.rs");
        assert_eq!(json["line"], 7);
        assert_eq!(json["side"], "RIGHT");
    }

    #[test]
    fn verdict_events() {
        assert_eq!(Verdict::Approve.as_event(), "APPROVE");
        assert_eq!(Verdict::Comment.as_event(), "COMMENT");
        assert_eq!(Verdict::RequestChanges.as_event(), "REQUEST_CHANGES");
    }

    #[test]
    fn verdict_from_str() {
        assert_eq!("approve".parse::<Verdict>().unwrap(), Verdict::Approve);
        assert_eq!("Comment".parse::<Verdict>().unwrap(), Verdict::Comment);
        assert!("merge".parse::<Verdict>().is_err());
    }
}
