//! Language-model provider clients.
//!
//! Two wire protocols hide behind one [`AiProvider`] capability: the
//! OpenAI-style chat-completions endpoint and the Anthropic messages
//! endpoint. Routing is by model-name prefix; both protocols return a
//! single textual completion.

use std::time::Duration;

use async_trait::async_trait;
use kestrel_core::{Credentials, KestrelError};
use serde::{Deserialize, Serialize};

const OPENAI_BASE_URL: &str = "https://api.openai.com";
const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// A message in a chat conversation with the model.
///
/// # Examples
///
/// ```
/// use kestrel_review::provider::{ChatMessage, Role};
///
/// let msg = ChatMessage {
///     role: Role::User,
///     content: "Review this code".into(),
/// };
/// assert!(matches!(msg.role, Role::User));
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    /// Role of the message sender.
    pub role: Role,
    /// Text content of the message.
    pub content: String,
}

/// Role in the chat conversation.
///
/// # Examples
///
/// ```
/// use kestrel_review::provider::Role;
///
/// assert_eq!(serde_json::to_string(&Role::System).unwrap(), "\"system\"");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System-level instructions.
    System,
    /// User input.
    User,
}

/// A uniform chat capability over the concrete model backends.
///
/// Implementations send one conversation and return the completion text.
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Human-readable provider name.
    fn name(&self) -> &'static str;

    /// Send a conversation to `model` and return the text response.
    ///
    /// # Errors
    ///
    /// Returns [`KestrelError::Provider`] on network failures, non-success
    /// HTTP statuses, or unparseable response bodies.
    async fn chat(&self, messages: &[ChatMessage], model: &str) -> Result<String, KestrelError>;
}

/// Select a provider for `model` and check its credential.
///
/// A model name starting with `claude` routes to the Anthropic backend;
/// anything else routes to the OpenAI backend. A missing credential for the
/// selected backend is a configuration error, raised before any network
/// call is made.
///
/// # Errors
///
/// Returns [`KestrelError::Config`] if the required API key is absent, or
/// [`KestrelError::Provider`] if the HTTP client cannot be built.
///
/// # Examples
///
/// ```
/// use kestrel_core::Credentials;
/// use kestrel_review::provider::resolve_provider;
///
/// let creds = Credentials {
///     anthropic_api_key: Some("sk-ant-test".into()),
///     ..Credentials::default()
/// };
/// let provider = resolve_provider("claude-3-5-sonnet-latest", &creds).unwrap();
/// assert_eq!(provider.name(), "anthropic");
/// ```
pub fn resolve_provider(
    model: &str,
    credentials: &Credentials,
) -> Result<Box<dyn AiProvider>, KestrelError> {
    if model.starts_with("claude") {
        let api_key = credentials.anthropic_api_key.as_deref().ok_or_else(|| {
            KestrelError::Config("ANTHROPIC_API_KEY is required for Claude models".into())
        })?;
        Ok(Box::new(AnthropicProvider::new(api_key)?))
    } else {
        let api_key = credentials.openai_api_key.as_deref().ok_or_else(|| {
            KestrelError::Config("OPENAI_API_KEY is required for OpenAI models".into())
        })?;
        Ok(Box::new(OpenAiProvider::new(api_key)?))
    }
}

/// Client for the OpenAI-style `/v1/chat/completions` protocol.
///
/// # Examples
///
/// ```
/// use kestrel_review::provider::OpenAiProvider;
///
/// let provider = OpenAiProvider::new("sk-test").unwrap();
/// ```
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiProvider {
    /// Create a client against the public OpenAI endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`KestrelError::Provider`] if the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>) -> Result<Self, KestrelError> {
        Self::with_base_url(api_key, OPENAI_BASE_URL)
    }

    /// Create a client against a custom base URL, e.g. a test server.
    ///
    /// # Errors
    ///
    /// Returns [`KestrelError::Provider`] if the HTTP client cannot be built.
    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, KestrelError> {
        Ok(Self {
            client: http_client()?,
            api_key: api_key.into(),
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl AiProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    /// Send all messages verbatim with temperature 0.1 and return the first
    /// choice's message content, or an empty string if absent.
    async fn chat(&self, messages: &[ChatMessage], model: &str) -> Result<String, KestrelError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = serde_json::json!({
            "model": model,
            "messages": messages,
            "temperature": 0.1,
        });

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| KestrelError::Provider(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(KestrelError::Provider(format!(
                "OpenAI API error {status}: {body_text}"
            )));
        }

        let response_body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| KestrelError::Provider(format!("failed to parse response: {e}")))?;

        let content = response_body
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .unwrap_or_default();

        Ok(content.to_string())
    }
}

/// Client for the Anthropic `/v1/messages` protocol.
///
/// # Examples
///
/// ```
/// use kestrel_review::provider::AnthropicProvider;
///
/// let provider = AnthropicProvider::new("sk-ant-test").unwrap();
/// ```
pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl AnthropicProvider {
    /// Create a client against the public Anthropic endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`KestrelError::Provider`] if the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>) -> Result<Self, KestrelError> {
        Self::with_base_url(api_key, ANTHROPIC_BASE_URL)
    }

    /// Create a client against a custom base URL, e.g. a test server.
    ///
    /// # Errors
    ///
    /// Returns [`KestrelError::Provider`] if the HTTP client cannot be built.
    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, KestrelError> {
        Ok(Self {
            client: http_client()?,
            api_key: api_key.into(),
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl AiProvider for AnthropicProvider {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    /// Lift the system message to the top-level `system` field, forward
    /// only user messages, and return the first content block's text, or
    /// an empty string if absent.
    async fn chat(&self, messages: &[ChatMessage], model: &str) -> Result<String, KestrelError> {
        let system = messages
            .iter()
            .find(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .unwrap_or_default();
        let user_messages: Vec<&ChatMessage> =
            messages.iter().filter(|m| m.role == Role::User).collect();

        let url = format!("{}/v1/messages", self.base_url);
        let body = serde_json::json!({
            "model": model,
            "max_tokens": 4096,
            "system": system,
            "messages": user_messages,
            "temperature": 0.1,
        });

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| KestrelError::Provider(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(KestrelError::Provider(format!(
                "Anthropic API error {status}: {body_text}"
            )));
        }

        let response_body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| KestrelError::Provider(format!("failed to parse response: {e}")))?;

        let content = response_body
            .get("content")
            .and_then(|c| c.get(0))
            .and_then(|b| b.get("text"))
            .and_then(|t| t.as_str())
            .unwrap_or_default();

        Ok(content.to_string())
    }
}

fn http_client() -> Result<reqwest::Client, KestrelError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(120))
        .build()
        .map_err(|e| KestrelError::Provider(format!("failed to create HTTP client: {e}")))
}
