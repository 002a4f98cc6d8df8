//! Pre-review file selection.
//!
//! Narrows the raw changed-file listing down to the files worth sending to
//! the model: files with a representable diff, not deleted, not binary by
//! extension, not excluded by a configured pattern, capped at the run's
//! file budget.

use kestrel_core::{ChangedFile, FileStatus, PullRequestFile};

use crate::pattern::ExcludeList;

/// Extensions that never carry a reviewable text diff.
const BINARY_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "ico", "svg", "woff", "woff2", "ttf", "eot", "mp4", "webm",
    "zip", "tar", "gz", "pdf",
];

/// Selection rules for a review run.
///
/// # Examples
///
/// ```
/// use kestrel_review::select::SelectOptions;
///
/// let options = SelectOptions {
///     max_files: 20,
///     exclude_patterns: vec!["*.lock".into()],
/// };
/// assert_eq!(options.max_files, 20);
/// ```
#[derive(Debug, Clone)]
pub struct SelectOptions {
    /// Upper bound on the number of files reviewed.
    pub max_files: usize,
    /// Glob-like patterns for files to skip.
    pub exclude_patterns: Vec<String>,
}

/// Produce the bounded, filtered set of files to review.
///
/// Keeps upstream order; files dropped by any rule do not count against
/// `max_files`.
///
/// # Examples
///
/// ```
/// use kestrel_core::{FileStatus, PullRequestFile};
/// use kestrel_review::select::{select_files, SelectOptions};
///
/// let raw = vec![PullRequestFile {
///     filename: "src/app.ts".into(),
///     patch: Some("@@ +1 @@".into()),
///     status: FileStatus::Modified,
/// }];
/// let options = SelectOptions { max_files: 20, exclude_patterns: vec![] };
/// let files = select_files(raw, &options);
/// assert_eq!(files.len(), 1);
/// ```
pub fn select_files(raw: Vec<PullRequestFile>, options: &SelectOptions) -> Vec<ChangedFile> {
    let excludes = ExcludeList::new(&options.exclude_patterns);

    raw.into_iter()
        .filter_map(|f| {
            let patch = f.patch.filter(|p| !p.is_empty())?;
            if f.status == FileStatus::Removed {
                return None;
            }
            if is_binary(&f.filename) {
                return None;
            }
            if excludes.is_excluded(&f.filename) {
                return None;
            }
            Some(ChangedFile {
                filename: f.filename,
                patch,
                status: f.status,
            })
        })
        .take(options.max_files)
        .collect()
}

/// Check whether a filename has a known binary/media extension.
///
/// The extension is the substring after the last `.`, compared
/// case-insensitively. A filename with no `.` has no extension.
fn is_binary(filename: &str) -> bool {
    let Some((_, ext)) = filename.rsplit_once('.') else {
        return false;
    };
    let ext = ext.to_ascii_lowercase();
    BINARY_EXTENSIONS.contains(&ext.as_str())
}
