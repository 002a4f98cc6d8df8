/// Errors that can occur across Kestrel.
///
/// Each variant wraps a specific error domain. Library crates use this type
/// directly; the binary crate converts to `miette::Report` at the boundary.
///
/// # Examples
///
/// ```
/// use kestrel_core::KestrelError;
///
/// let err = KestrelError::Config("missing API key".into());
/// assert!(err.to_string().contains("missing API key"));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum KestrelError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// GitHub API or network failure.
    #[error("GitHub error: {0}")]
    Github(String),

    /// Language-model provider API or response error.
    #[error("provider error: {0}")]
    Provider(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}
