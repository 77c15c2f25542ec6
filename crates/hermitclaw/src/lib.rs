//! A hermit crab that lives in a box directory and talks to a model.
//!
//! The crate includes a CLI tool for chatting with the crab in the terminal.
//! And you can also use it as a library to host a crab in your own app.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod session;
pub mod tools;

pub use session::{DEFAULT_MAX_STEPS, Error, Session, SessionBuilder};

/// Re-exports of [`hermitclaw_core`] crate.
pub mod core {
    pub use hermitclaw_core::*;
}
