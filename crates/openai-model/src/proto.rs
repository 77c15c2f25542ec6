//! Wire formats and the conversions between them and the unified model.
//!
//! Each protocol is a strategy type implementing [`Protocol`]. The
//! provider picks one when it is configured, and everything
//! protocol-specific stays inside that type.

mod chat;
mod embeddings;
mod responses;

use hermitclaw_model::{CallResult, ModelRequest};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::Error;

pub use chat::ChatCompletions;
pub use embeddings::{EmbeddingRequest, EmbeddingResponse};
pub use responses::Responses;

/// A request/response protocol spoken over one HTTP endpoint.
pub trait Protocol {
    /// Endpoint path, relative to the base URL.
    const PATH: &'static str;

    /// The body sent to the server.
    type Request: Serialize + 'static;

    /// The body received from the server.
    type Response: DeserializeOwned + Send + 'static;

    /// Converts a unified request into this protocol's request body.
    fn encode(req: &ModelRequest, model: &str) -> Self::Request;

    /// Converts this protocol's response body into a unified result.
    fn normalize(resp: Self::Response) -> Result<CallResult, Error>;
}
