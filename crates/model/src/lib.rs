//! Protocol-agnostic types shared by every model provider.
//!
//! This crate establishes the unified transcript a crab keeps while
//! talking to its model, and the canonical shape of a model's answer.
//! Providers translate between these types and their own wire formats,
//! so the rest of the workspace never sees a provider's quirks.
//!
//! Types in this crate don't define any network behavior, instead they
//! are the constraints that the implementors should adhere to.

#![deny(missing_docs)]

mod error;
mod opaque;
mod provider;
mod request;
mod response;
mod tool;
mod transcript;

pub use error::*;
pub use opaque::*;
pub use provider::*;
pub use request::*;
pub use response::*;
pub use tool::*;
pub use transcript::*;
