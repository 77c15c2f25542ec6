use std::error::Error;

use crate::error::ErrorKind;
use crate::request::ModelRequest;
use crate::response::CallResult;

/// The error type for a model provider.
pub trait ModelProviderError: Error + Send + Sync + 'static {
    /// Returns the kind of this error.
    fn kind(&self) -> ErrorKind;
}

/// A type that represents a model provider, which encodes requests into
/// its wire format, sends them, and normalizes whatever comes back.
///
/// Once the provider is created, it should behave like a stateless object.
/// It can still have internal state (a connection pool, for example), but
/// callers should not rely on it, and the provider should be prepared for
/// being dropped anytime. Concurrent requests with independent transcripts
/// must not affect each other.
pub trait ModelProvider: Send + Sync {
    /// The error type that may be returned by the provider.
    type Error: ModelProviderError;

    /// Sends a request to the model and waits for the complete result.
    ///
    /// Transport and authentication failures, as well as responses that
    /// lack required fields, are returned as errors. Malformed tool call
    /// arguments are not errors: they are replaced with an empty object.
    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<CallResult, Self::Error>> + Send + 'static;

    /// Returns the embedding vector of `text`.
    ///
    /// Repeated calls with the same text and model return vectors of the
    /// same length, but not necessarily identical values.
    fn embed(
        &self,
        text: &str,
    ) -> impl Future<Output = Result<Vec<f32>, Self::Error>> + Send + 'static;
}
