//! Core logic of a crab's brain: the tool catalog, the transcript and the
//! model client that turns both into provider requests.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod model_client;
pub mod tool;
mod transcript;

pub use model_client::{CallOptions, ModelClient};
pub use transcript::{Transcript, UnmatchedToolResult};
