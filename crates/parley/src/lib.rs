//! A terminal chat with an agent that can search the web and look things
//! up on Wikipedia.
//!
//! The crate includes a CLI for chatting in the terminal. The [`Session`]
//! type can also be driven by other front ends through [`ChatView`].

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

pub mod config;
mod error;
mod session;
#[cfg(feature = "cli")]
pub mod terminal;
pub mod tools;
mod transcript;

pub use config::{ConfigError, Settings};
pub use error::Error;
pub use session::{ChatView, Session, build_agent};
pub use transcript::{Transcript, Turn};

/// Re-exports of [`parley_core`] crate.
pub mod core {
    pub use parley_core::*;
}
