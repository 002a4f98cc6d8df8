use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::KestrelError;

/// Run configuration for a review.
///
/// Supports layered resolution: CLI flags > env vars > config file > defaults.
/// The file layer is `.kestrel.toml`; the env layer follows the CI
/// convention of `INPUT_*` variables.
///
/// # Examples
///
/// ```
/// use kestrel_core::RunConfig;
///
/// let config = RunConfig::default();
/// assert_eq!(config.model, "gpt-4o");
/// assert_eq!(config.max_files, 20);
/// assert!(config.exclude_patterns.is_empty());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Model identifier sent to the provider (default: `"gpt-4o"`).
    #[serde(default = "default_model")]
    pub model: String,
    /// Maximum number of files to review per run (default: 20).
    #[serde(default = "default_max_files")]
    pub max_files: usize,
    /// Glob-like patterns for files to exclude from review.
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
    /// Free-text instructions appended to every per-file prompt.
    pub custom_instructions: Option<String>,
}

fn default_model() -> String {
    "gpt-4o".into()
}

fn default_max_files() -> usize {
    20
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            max_files: default_max_files(),
            exclude_patterns: Vec::new(),
            custom_instructions: None,
        }
    }
}

impl RunConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`KestrelError::Io`] if the file cannot be read, or
    /// [`KestrelError::Toml`] if the content is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use kestrel_core::RunConfig;
    /// use std::path::Path;
    ///
    /// let config = RunConfig::from_file(Path::new(".kestrel.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, KestrelError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`KestrelError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use kestrel_core::RunConfig;
    ///
    /// let toml = r#"
    /// model = "claude-sonnet-4-20250514"
    /// max_files = 10
    /// "#;
    /// let config = RunConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.max_files, 10);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, KestrelError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Overlay the `INPUT_*` CI environment variables onto this config.
    ///
    /// Reads `INPUT_MODEL`, `INPUT_MAX_FILES`, `INPUT_EXCLUDE_PATTERNS`
    /// (comma-separated) and `INPUT_CUSTOM_INSTRUCTIONS`. Unset or empty
    /// variables leave the existing value untouched.
    ///
    /// # Errors
    ///
    /// Returns [`KestrelError::Config`] if `INPUT_MAX_FILES` is not a number.
    pub fn apply_env(&mut self) -> Result<(), KestrelError> {
        self.apply_lookup(|key| std::env::var(key).ok())
    }

    /// Overlay env-style values from an arbitrary lookup function.
    ///
    /// [`apply_env`](Self::apply_env) delegates here; tests pass a map-backed
    /// closure instead of touching process-global state.
    ///
    /// # Errors
    ///
    /// Returns [`KestrelError::Config`] if `INPUT_MAX_FILES` is not a number.
    ///
    /// # Examples
    ///
    /// ```
    /// use kestrel_core::RunConfig;
    ///
    /// let mut config = RunConfig::default();
    /// config
    ///     .apply_lookup(|key| (key == "INPUT_MODEL").then(|| "claude-3-5-sonnet".to_string()))
    ///     .unwrap();
    /// assert_eq!(config.model, "claude-3-5-sonnet");
    /// ```
    pub fn apply_lookup(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), KestrelError> {
        if let Some(model) = non_empty(lookup("INPUT_MODEL")) {
            self.model = model;
        }
        if let Some(raw) = non_empty(lookup("INPUT_MAX_FILES")) {
            self.max_files = raw.trim().parse().map_err(|_| {
                KestrelError::Config(format!("INPUT_MAX_FILES is not a number: '{raw}'"))
            })?;
        }
        if let Some(raw) = non_empty(lookup("INPUT_EXCLUDE_PATTERNS")) {
            self.exclude_patterns = parse_exclude_patterns(&raw);
        }
        if let Some(instructions) = non_empty(lookup("INPUT_CUSTOM_INSTRUCTIONS")) {
            self.custom_instructions = Some(instructions);
        }
        Ok(())
    }
}

/// Split a comma-separated pattern list, trimming entries and dropping
/// empty ones.
///
/// # Examples
///
/// ```
/// use kestrel_core::parse_exclude_patterns;
///
/// let patterns = parse_exclude_patterns("*.lock, dist/** ,,");
/// assert_eq!(patterns, vec!["*.lock", "dist/**"]);
/// ```
pub fn parse_exclude_patterns(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect()
}

/// Secrets for the external services, read from the environment only.
///
/// Each key is looked up as `INPUT_<NAME>` first (the CI input convention),
/// then as the bare variable name.
///
/// # Examples
///
/// ```
/// use kestrel_core::Credentials;
///
/// let creds = Credentials::from_lookup(|key| {
///     (key == "OPENAI_API_KEY").then(|| "sk-test".to_string())
/// });
/// assert_eq!(creds.openai_api_key.as_deref(), Some("sk-test"));
/// assert!(creds.github_token.is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    /// Token for the GitHub API.
    pub github_token: Option<String>,
    /// API key for OpenAI-style models.
    pub openai_api_key: Option<String>,
    /// API key for Anthropic models.
    pub anthropic_api_key: Option<String>,
}

impl Credentials {
    /// Read credentials from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read credentials from an arbitrary lookup function.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| {
            non_empty(lookup(&format!("INPUT_{name}"))).or_else(|| non_empty(lookup(name)))
        };
        Self {
            github_token: get("GITHUB_TOKEN"),
            openai_api_key: get("OPENAI_API_KEY"),
            anthropic_api_key: get("ANTHROPIC_API_KEY"),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn default_config_has_expected_values() {
        let config = RunConfig::default();
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.max_files, 20);
        assert!(config.exclude_patterns.is_empty());
        assert!(config.custom_instructions.is_none());
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let config = RunConfig::from_toml("").unwrap();
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.max_files, 20);
    }

    #[test]
    fn parse_full_toml() {
        let toml = r#"
model = "claude-3-5-sonnet-latest"
max_files = 5
exclude_patterns = ["*.lock", "dist/**"]
custom_instructions = "Focus on security"
"#;
        let config = RunConfig::from_toml(toml).unwrap();
        assert_eq!(config.model, "claude-3-5-sonnet-latest");
        assert_eq!(config.max_files, 5);
        assert_eq!(config.exclude_patterns, vec!["*.lock", "dist/**"]);
        assert_eq!(config.custom_instructions.as_deref(), Some("Focus on security"));
    }

    #[test]
    fn invalid_toml_returns_error() {
        assert!(RunConfig::from_toml("{{invalid}}").is_err());
    }

    #[test]
    fn env_overlay_overrides_file_values() {
        let vars = env(&[
            ("INPUT_MODEL", "gpt-4o-mini"),
            ("INPUT_MAX_FILES", "3"),
            ("INPUT_EXCLUDE_PATTERNS", "*.snap,fixtures/**"),
            ("INPUT_CUSTOM_INSTRUCTIONS", "Be terse"),
        ]);
        let mut config = RunConfig::from_toml("max_files = 50").unwrap();
        config.apply_lookup(|k| vars.get(k).cloned()).unwrap();
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.max_files, 3);
        assert_eq!(config.exclude_patterns, vec!["*.snap", "fixtures/**"]);
        assert_eq!(config.custom_instructions.as_deref(), Some("Be terse"));
    }

    #[test]
    fn env_overlay_leaves_unset_values() {
        let mut config = RunConfig::default();
        config.apply_lookup(|_| None).unwrap();
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.max_files, 20);
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let vars = env(&[("INPUT_MODEL", ""), ("INPUT_EXCLUDE_PATTERNS", "  ")]);
        let mut config = RunConfig::default();
        config.apply_lookup(|k| vars.get(k).cloned()).unwrap();
        assert_eq!(config.model, "gpt-4o");
        assert!(config.exclude_patterns.is_empty());
    }

    #[test]
    fn non_numeric_max_files_is_config_error() {
        let vars = env(&[("INPUT_MAX_FILES", "lots")]);
        let mut config = RunConfig::default();
        let err = config.apply_lookup(|k| vars.get(k).cloned()).unwrap_err();
        assert!(err.to_string().contains("INPUT_MAX_FILES"));
    }

    #[test]
    fn exclude_patterns_split_and_trimmed() {
        assert_eq!(
            parse_exclude_patterns("*.lock, dist/**,  ,docs/*"),
            vec!["*.lock", "dist/**", "docs/*"]
        );
        assert!(parse_exclude_patterns("").is_empty());
        assert!(parse_exclude_patterns(" , ,").is_empty());
    }

    #[test]
    fn credentials_prefer_input_prefixed_vars() {
        let vars = env(&[
            ("INPUT_GITHUB_TOKEN", "ghs_input"),
            ("GITHUB_TOKEN", "ghs_plain"),
            ("ANTHROPIC_API_KEY", "sk-ant"),
        ]);
        let creds = Credentials::from_lookup(|k| vars.get(k).cloned());
        assert_eq!(creds.github_token.as_deref(), Some("ghs_input"));
        assert_eq!(creds.anthropic_api_key.as_deref(), Some("sk-ant"));
        assert!(creds.openai_api_key.is_none());
    }
}
