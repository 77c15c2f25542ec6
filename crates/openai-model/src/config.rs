use std::env;
use std::fmt::Debug;

/// The base URL of the native protocol.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
/// The chat model used when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-5.2";
/// The embedding model used when none is configured.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// The wire protocol a provider speaks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WireProtocol {
    /// The native Responses API, with one ordered sequence of messages,
    /// tool calls and tool results.
    Responses,
    /// The OpenAI-compatible Chat Completions API, with role-tagged
    /// messages and batched tool calls.
    ChatCompletions,
}

/// Builder for [`OpenAIConfig`].
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct OpenAIConfigBuilder {
    api_key: String,
    model: Option<String>,
    base_url: Option<String>,
    embedding_model: Option<String>,
    protocol: Option<WireProtocol>,
}

impl OpenAIConfigBuilder {
    /// Creates a builder with the given API key.
    #[inline]
    pub fn with_api_key<S: Into<String>>(api_key: S) -> Self {
        Self {
            api_key: api_key.into(),
            model: None,
            base_url: None,
            embedding_model: None,
            protocol: None,
        }
    }

    /// Creates a builder from the environment.
    ///
    /// Reads `OPENAI_API_KEY`, `OPENAI_BASE_URL`, `OPENAI_MODEL` and
    /// `OPENAI_EMBEDDING_MODEL`. Returns `None` if the API key is not set.
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("OPENAI_API_KEY").ok()?;
        let mut builder = Self::with_api_key(api_key);
        if let Ok(base_url) = env::var("OPENAI_BASE_URL") {
            builder = builder.with_base_url(base_url);
        }
        if let Ok(model) = env::var("OPENAI_MODEL") {
            builder = builder.with_model(model);
        }
        if let Ok(model) = env::var("OPENAI_EMBEDDING_MODEL") {
            builder = builder.with_embedding_model(model);
        }
        Some(builder)
    }

    /// Sets the model to use.
    #[inline]
    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets a custom base URL.
    ///
    /// A custom base URL switches the provider to the Chat Completions
    /// protocol, which is what OpenAI-compatible services speak. An empty
    /// URL is the same as not setting one.
    #[inline]
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the model used for embeddings.
    #[inline]
    pub fn with_embedding_model<S: Into<String>>(mut self, model: S) -> Self {
        self.embedding_model = Some(model.into());
        self
    }

    /// Forces a wire protocol instead of inferring it from the base URL.
    ///
    /// Useful for proxies that serve the native protocol under their own
    /// address.
    #[inline]
    pub fn with_protocol(mut self, protocol: WireProtocol) -> Self {
        self.protocol = Some(protocol);
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> OpenAIConfig {
        let custom_base_url =
            self.base_url.as_deref().and_then(normalize_base_url);
        let protocol = self.protocol.unwrap_or(if custom_base_url.is_some() {
            WireProtocol::ChatCompletions
        } else {
            WireProtocol::Responses
        });
        OpenAIConfig {
            api_key: self.api_key,
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_owned()),
            base_url: custom_base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned()),
            embedding_model: self
                .embedding_model
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_owned()),
            protocol,
        }
    }
}

impl Debug for OpenAIConfigBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIConfigBuilder")
            .field("api_key", &"<deducted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("embedding_model", &self.embedding_model)
            .field("protocol", &self.protocol)
            .finish()
    }
}

/// Configuration for the OpenAI provider.
///
/// The wire protocol is decided when the configuration is built and
/// never changes afterwards.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct OpenAIConfig {
    pub(crate) api_key: String,
    pub(crate) model: String,
    pub(crate) base_url: String,
    pub(crate) embedding_model: String,
    pub(crate) protocol: WireProtocol,
}

impl OpenAIConfig {
    /// Returns the wire protocol selected for this configuration.
    #[inline]
    pub fn protocol(&self) -> WireProtocol {
        self.protocol
    }

    /// Returns the chat model name.
    #[inline]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns the embedding model name.
    #[inline]
    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    /// Returns the base URL requests are sent to.
    #[inline]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Debug for OpenAIConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIConfig")
            .field("api_key", &"<deducted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("embedding_model", &self.embedding_model)
            .field("protocol", &self.protocol)
            .finish()
    }
}

fn normalize_base_url(base_url: &str) -> Option<String> {
    let base_url = base_url.trim().trim_end_matches('/');
    if base_url.is_empty() {
        return None;
    }
    Some(base_url.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OpenAIConfigBuilder::with_api_key("xxx").build();
        assert_eq!(config.protocol(), WireProtocol::Responses);
        assert_eq!(config.base_url(), DEFAULT_BASE_URL);
        assert_eq!(config.model(), DEFAULT_MODEL);
        assert_eq!(config.embedding_model(), "text-embedding-3-small");
    }

    #[test]
    fn test_custom_base_url_selects_chat_completions() {
        let config = OpenAIConfigBuilder::with_api_key("xxx")
            .with_base_url("https://api.z.ai/api/paas/v4/")
            .with_model("glm-4.6")
            .build();
        assert_eq!(config.protocol(), WireProtocol::ChatCompletions);
        assert_eq!(config.base_url(), "https://api.z.ai/api/paas/v4");
        assert_eq!(config.model(), "glm-4.6");
    }

    #[test]
    fn test_blank_base_url_is_ignored() {
        let config = OpenAIConfigBuilder::with_api_key("xxx")
            .with_base_url("  / ")
            .build();
        assert_eq!(config.protocol(), WireProtocol::Responses);
        assert_eq!(config.base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn test_forced_protocol() {
        let config = OpenAIConfigBuilder::with_api_key("xxx")
            .with_base_url("http://localhost:8080/v1")
            .with_protocol(WireProtocol::Responses)
            .build();
        assert_eq!(config.protocol(), WireProtocol::Responses);
        assert_eq!(config.base_url(), "http://localhost:8080/v1");
    }

    #[test]
    fn test_debug_hides_api_key() {
        let config = OpenAIConfigBuilder::with_api_key("sk-secret").build();
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
    }
}
