//! Glob-like exclusion patterns.
//!
//! A pattern matches the whole filename: literal characters (including `.`)
//! match literally, `*` matches any run of characters except `/`, and `**`
//! matches any run of characters including `/`. Patterns are translated to
//! anchored regular expressions.

use regex::Regex;

/// Test a filename against a single exclusion pattern.
///
/// # Examples
///
/// ```
/// use kestrel_review::pattern::matches;
///
/// assert!(matches("yarn.lock", "*.lock"));
/// assert!(matches("dist/bundle.js", "dist/**"));
/// assert!(!matches("a/b.ts", "*.ts"));
/// ```
pub fn matches(filename: &str, pattern: &str) -> bool {
    Regex::new(&pattern_to_regex(pattern))
        .map(|re| re.is_match(filename))
        .unwrap_or(false)
}

/// A pre-compiled list of exclusion patterns.
///
/// Patterns that fail to compile are skipped. An empty list excludes
/// nothing.
///
/// # Examples
///
/// ```
/// use kestrel_review::pattern::ExcludeList;
///
/// let excludes = ExcludeList::new(&["*.lock".into(), "dist/**".into()]);
/// assert!(excludes.is_excluded("yarn.lock"));
/// assert!(!excludes.is_excluded("src/app.ts"));
/// ```
pub struct ExcludeList {
    regexes: Vec<Regex>,
}

impl ExcludeList {
    /// Compile a pattern list.
    pub fn new(patterns: &[String]) -> Self {
        let mut regexes = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            if let Ok(re) = Regex::new(&pattern_to_regex(pattern)) {
                regexes.push(re);
            }
        }
        Self { regexes }
    }

    /// Test whether any pattern matches the filename.
    pub fn is_excluded(&self, filename: &str) -> bool {
        self.regexes.iter().any(|re| re.is_match(filename))
    }
}

fn pattern_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 8);
    out.push('^');
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' if chars.peek() == Some(&'*') => {
                chars.next();
                out.push_str(".*");
            }
            '*' => out.push_str("[^/]*"),
            _ => out.push_str(&regex::escape(&c.to_string())),
        }
    }
    out.push('$');
    out
}
