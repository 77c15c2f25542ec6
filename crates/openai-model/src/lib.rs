//! A model provider for OpenAI and OpenAI-compatible APIs.
//!
//! The provider speaks one of two wire protocols, fixed by its
//! [`OpenAIConfig`]: the native Responses API by default, or the Chat
//! Completions API when a custom base URL is configured.

#[macro_use]
extern crate tracing;

mod config;
mod error;
mod proto;

use std::pin::Pin;
use std::sync::Arc;

use hermitclaw_model::{CallResult, ModelProvider, ModelRequest};
use mime::Mime;
use reqwest::{Client, header};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::Instrument;

pub use config::{
    DEFAULT_BASE_URL, DEFAULT_EMBEDDING_MODEL, DEFAULT_MODEL, OpenAIConfig,
    OpenAIConfigBuilder, WireProtocol,
};
pub use error::Error;
use proto::{
    ChatCompletions, EmbeddingRequest, EmbeddingResponse, Protocol, Responses,
};

type PinnedFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// OpenAI model provider.
///
/// Cloning is cheap, clones share the configuration and the connection
/// pool.
#[derive(Clone, Debug)]
pub struct OpenAIProvider {
    client: Client,
    config: Arc<OpenAIConfig>,
}

impl OpenAIProvider {
    /// Creates a new `OpenAIProvider` with the given configuration.
    #[inline]
    pub fn new(config: OpenAIConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }

    /// Returns the wire protocol this provider speaks.
    #[inline]
    pub fn protocol(&self) -> WireProtocol {
        self.config.protocol
    }

    fn round_trip<P: Protocol>(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<CallResult, Error>> + Send + 'static {
        let body = P::encode(req, &self.config.model);
        let resp_fut = self.post_json::<_, P::Response>(P::PATH, &body);
        async move { P::normalize(resp_fut.await?) }
    }

    fn post_json<B, R>(
        &self,
        path: &str,
        body: &B,
    ) -> impl Future<Output = Result<R, Error>> + Send + 'static + use<B, R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned + Send + 'static,
    {
        let url = format!("{}{}", self.config.base_url, path);
        let resp_fut = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .header(header::ACCEPT, "application/json")
            .json(body)
            .send();

        async move {
            let resp = resp_fut.await.map_err(Error::from_transport)?;
            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(Error::from_status(status, &body));
            }

            // A missing content type is tolerated, a wrong one is not.
            let content_type = resp
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok());
            if let Some(content_type) = content_type {
                let is_json = content_type
                    .parse()
                    .map(|m: Mime| {
                        m.subtype() == mime::JSON
                            || m.suffix().is_some_and(|s| s == mime::JSON)
                    })
                    .unwrap_or(false);
                if !is_json {
                    return Err(Error::malformed(format!(
                        "Unexpected content type: {content_type}"
                    )));
                }
            }

            let bytes = resp.bytes().await.map_err(Error::from_transport)?;
            trace!("got a response: {}", String::from_utf8_lossy(&bytes));
            serde_json::from_slice(&bytes).map_err(|err| {
                Error::malformed(format!("Invalid response body: {err}"))
            })
        }
        .instrument(debug_span!("openai post", %url))
    }
}

impl ModelProvider for OpenAIProvider {
    type Error = Error;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<CallResult, Self::Error>> + Send + 'static
    {
        // The protocol is fixed by the configuration, this is the only
        // place that looks at it.
        let fut: PinnedFuture<Result<CallResult, Error>> =
            match self.config.protocol {
                WireProtocol::Responses => {
                    Box::pin(self.round_trip::<Responses>(req))
                }
                WireProtocol::ChatCompletions => {
                    Box::pin(self.round_trip::<ChatCompletions>(req))
                }
            };
        fut
    }

    fn embed(
        &self,
        text: &str,
    ) -> impl Future<Output = Result<Vec<f32>, Self::Error>> + Send + 'static
    {
        let body = EmbeddingRequest {
            model: self.config.embedding_model.clone(),
            input: text.to_owned(),
        };
        let resp_fut =
            self.post_json::<_, EmbeddingResponse>("/embeddings", &body);
        async move { resp_fut.await?.into_vector() }
    }
}
