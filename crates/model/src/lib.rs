//! The protocol between the agent and the language models it talks to.
//!
//! Everything the agent knows about a model goes through the types in this
//! crate: a [`ModelRequest`] carries the prompt messages and the tools the
//! model may call, and a [`ModelResponse`] streams back text deltas, tool
//! call requests and a finish reason.
//!
//! The crate is deliberately behavior-free. Concrete providers (an
//! OpenAI-compatible HTTP client, a scripted fake for tests) live in their
//! own crates and implement [`ModelProvider`].

#![deny(missing_docs)]

mod error;
mod opaque;
mod provider;
mod request;
mod response;

pub use error::*;
pub use opaque::*;
pub use provider::*;
pub use request::*;
pub use response::*;
