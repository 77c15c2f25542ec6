use std::pin::Pin;
use std::sync::Arc;

use hermitclaw_model::{
    CallResult, DEFAULT_MAX_OUTPUT_TOKENS, ModelProvider, ModelProviderError,
    ModelRequest, TranscriptItem,
};
use tracing::Instrument;

use crate::tool::ToolCatalog;

type BoxedError = Box<dyn ModelProviderError>;
type BoxedFuture<T> =
    Pin<Box<dyn Future<Output = Result<T, BoxedError>> + Send>>;

trait ProviderObject: Send + Sync + 'static {
    fn send_request(&self, req: &ModelRequest) -> BoxedFuture<CallResult>;

    fn embed(&self, text: &str) -> BoxedFuture<Vec<f32>>;
}

struct AnyProvider<P: ModelProvider>(P);

impl<P: ModelProvider + 'static> ProviderObject for AnyProvider<P> {
    fn send_request(&self, req: &ModelRequest) -> BoxedFuture<CallResult> {
        trace!("got a request: {req:?}");
        let fut = self.0.send_request(req);
        Box::pin(
            async move {
                let result = fut.await.map_err(|err| {
                    error!("got an error: {err:?}");
                    Box::new(err) as BoxedError
                })?;
                debug!(
                    "finished a request with {} tool call(s)",
                    result.tool_calls.len()
                );
                Ok(result)
            }
            .instrument(trace_span!("model client req")),
        )
    }

    fn embed(&self, text: &str) -> BoxedFuture<Vec<f32>> {
        let fut = self.0.embed(text);
        Box::pin(
            async move {
                fut.await.map_err(|err| {
                    error!("got an error: {err:?}");
                    Box::new(err) as BoxedError
                })
            }
            .instrument(trace_span!("model client embed")),
        )
    }
}

/// Options of a single model call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallOptions {
    /// Whether the catalog is offered to the model.
    pub tools: bool,
    /// The system instructions. Empty instructions are the same as none.
    pub instructions: Option<String>,
    /// The maximum number of tokens the model may produce.
    pub max_output_tokens: u32,
}

impl CallOptions {
    /// Disables tools for this call.
    #[inline]
    pub fn without_tools(mut self) -> Self {
        self.tools = false;
        self
    }

    /// Sets the system instructions.
    #[inline]
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Sets the output token budget.
    #[inline]
    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }
}

impl Default for CallOptions {
    #[inline]
    fn default() -> Self {
        Self {
            tools: true,
            instructions: None,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
        }
    }
}

/// A wrapper around a model provider that owns the tool catalog and
/// provides a type-erased interface for the other modules.
///
/// Cloning is cheap, clones share the provider and the catalog.
#[derive(Clone)]
pub struct ModelClient {
    provider: Arc<dyn ProviderObject>,
    catalog: Arc<ToolCatalog>,
}

impl ModelClient {
    /// Creates a client offering the crab's catalog.
    #[inline]
    pub fn new<P: ModelProvider + 'static>(provider: P) -> Self {
        // We have to erase the type `P`, since `ModelClient` doesn't have a
        // generic parameter and we don't want it either.
        Self {
            provider: Arc::new(AnyProvider(provider)),
            catalog: Arc::new(ToolCatalog::crab()),
        }
    }

    /// Replaces the catalog offered to the model.
    #[inline]
    pub fn with_catalog(mut self, catalog: ToolCatalog) -> Self {
        self.catalog = Arc::new(catalog);
        self
    }

    /// Returns the catalog offered to the model.
    #[inline]
    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    /// Sends the transcript to the model and returns the normalized result.
    ///
    /// The caller is expected to append `append_items` of the result to its
    /// transcript before the next call.
    pub async fn call(
        &self,
        transcript: &[TranscriptItem],
        options: CallOptions,
    ) -> Result<CallResult, BoxedError> {
        let tools = if options.tools {
            self.catalog.tools().to_vec()
        } else {
            vec![]
        };
        let req = ModelRequest {
            transcript: transcript.to_vec(),
            instructions: options.instructions,
            tools,
            max_output_tokens: options.max_output_tokens,
        };
        self.provider.send_request(&req).await
    }

    /// Calls the model without tools and returns only its text, which is
    /// empty if the model said nothing.
    pub async fn short_call(
        &self,
        transcript: &[TranscriptItem],
        instructions: Option<&str>,
    ) -> Result<String, BoxedError> {
        let options = CallOptions {
            instructions: instructions.map(str::to_owned),
            ..Default::default()
        }
        .without_tools();
        let result = self.call(transcript, options).await?;
        Ok(result.text.unwrap_or_default())
    }

    /// Returns the embedding vector of `text`.
    #[inline]
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, BoxedError> {
        self.provider.embed(text).await
    }
}
