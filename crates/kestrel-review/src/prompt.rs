//! Prompt construction and model-response parsing.
//!
//! The response parser is deliberately lenient: a noisy or broken model
//! reply must never block the pipeline, so anything that does not parse
//! into the expected comment array is treated as "no issues found".

use kestrel_core::{ChangedFile, ReviewComment, Side};

const SYSTEM_PROMPT: &str = "\
You are an expert code reviewer. Review the following code diff and identify issues.

For each issue found, respond with a JSON array of objects:
[
  {
    \"line\": <line_number_in_the_new_file>,
    \"comment\": \"<concise description of the issue and suggested fix>\"
  }
]

Focus on:
- Bugs and logic errors
- Security vulnerabilities
- Performance issues
- Missing error handling
- Type safety issues

Do NOT comment on:
- Style/formatting (leave that to linters)
- Minor naming preferences
- Import ordering

If the code looks good, respond with an empty array: []

IMPORTANT: Only respond with valid JSON. No markdown, no explanation outside the JSON.";

/// Header prepended to every published comment so readers can tell it came
/// from the bot.
const ATTRIBUTION_HEADER: &str = "\u{1f916} **AI Review**";

/// Build the fixed system prompt for the review conversation.
///
/// # Examples
///
/// ```
/// use kestrel_review::prompt::build_system_prompt;
///
/// let prompt = build_system_prompt();
/// assert!(prompt.contains("JSON array"));
/// assert!(prompt.contains("Security"));
/// ```
pub fn build_system_prompt() -> String {
    SYSTEM_PROMPT.to_string()
}

/// Build the per-file user prompt: filename, status, fenced diff, and the
/// run's custom instructions as a trailing paragraph when non-empty.
///
/// # Examples
///
/// ```
/// use kestrel_core::{ChangedFile, FileStatus};
/// use kestrel_review::prompt::build_file_prompt;
///
/// let file = ChangedFile {
///     filename: "src/app.ts".into(),
///     patch: "+const x = 1;".into(),
///     status: FileStatus::Modified,
/// };
/// let prompt = build_file_prompt(&file, "");
/// assert!(prompt.contains("File: src/app.ts"));
/// assert!(prompt.contains("+const x = 1;"));
/// ```
pub fn build_file_prompt(file: &ChangedFile, custom_instructions: &str) -> String {
    let mut prompt = format!(
        "File: {}\nStatus: {}\n\nDiff:\n```\n{}\n```",
        file.filename, file.status, file.patch
    );
    if !custom_instructions.is_empty() {
        prompt.push_str(&format!("\n\nAdditional instructions: {custom_instructions}"));
    }
    prompt
}

/// Parse a model reply into validated line-anchored comments for `filename`.
///
/// Total over all inputs. Code fences are stripped, the remainder is parsed
/// as JSON, and only array elements with a numeric `line` and a textual
/// `comment` survive; everything else yields an empty list.
///
/// # Examples
///
/// ```
/// use kestrel_review::prompt::parse_review_response;
///
/// let reply = r#"[{"line": 1, "comment": "eval() is a security risk"}]"#;
/// let comments = parse_review_response(reply, "src/app.ts");
/// assert_eq!(comments.len(), 1);
/// assert_eq!(comments[0].path, "src/app.ts");
///
/// assert!(parse_review_response("not json", "src/app.ts").is_empty());
/// ```
pub fn parse_review_response(response: &str, filename: &str) -> Vec<ReviewComment> {
    let cleaned = strip_code_fences(response);

    let Ok(parsed) = serde_json::from_str::<serde_json::Value>(cleaned) else {
        return Vec::new();
    };
    let Some(items) = parsed.as_array() else {
        return Vec::new();
    };

    let mut comments = Vec::new();
    for item in items {
        let Some(line) = item.get("line").and_then(serde_json::Value::as_u64) else {
            continue;
        };
        let Some(text) = item.get("comment").and_then(serde_json::Value::as_str) else {
            continue;
        };
        comments.push(ReviewComment {
            path: filename.to_string(),
            line,
            side: Side::Right,
            body: format!("{ATTRIBUTION_HEADER}\n\n{text}"),
        });
    }
    comments
}

fn strip_code_fences(s: &str) -> &str {
    let trimmed = s.trim();
    if let Some(rest) = trimmed.strip_prefix("```json") {
        if let Some(inner) = rest.strip_suffix("```") {
            return inner.trim();
        }
    }
    if let Some(rest) = trimmed.strip_prefix("```") {
        if let Some(inner) = rest.strip_suffix("```") {
            return inner.trim();
        }
    }
    trimmed
}
