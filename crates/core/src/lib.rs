//! Core logic of the chat agent: the tool-calling loop, tool registry,
//! conversational memory and step events.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod agent;
pub mod memory;
mod model_client;
pub mod tool;

pub use agent::{
    Agent, AgentBuilder, AgentError, AgentErrorKind, Executor,
    ITERATION_LIMIT_ANSWER, StepEvent, StepSink,
};
pub use memory::{ConversationMemory, Role};
