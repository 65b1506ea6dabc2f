//! Conversational memory owned by the agent.
//!
//! The memory only keeps what was said: one user entry and one assistant
//! entry per completed run. Tool calls and their results are scratch work
//! of a single run and never end up here.

use std::fmt::{self, Display};

use parley_model::ModelMessage;
use serde::{Deserialize, Serialize};

/// Who said something.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person chatting.
    User,
    /// The agent.
    Assistant,
}

impl Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => f.write_str("user"),
            Role::Assistant => f.write_str("assistant"),
        }
    }
}

/// One remembered message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemoryEntry {
    role: Role,
    content: String,
}

impl MemoryEntry {
    /// Returns who said this.
    #[inline]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns what was said.
    #[inline]
    pub fn content(&self) -> &str {
        &self.content
    }

    fn to_message(&self) -> ModelMessage {
        match self.role {
            Role::User => ModelMessage::User(self.content.clone()),
            Role::Assistant => ModelMessage::Assistant(self.content.clone()),
        }
    }
}

/// A buffer that remembers the whole conversation.
#[derive(Clone, Debug, Default)]
pub struct ConversationMemory {
    entries: Vec<MemoryEntry>,
}

impl ConversationMemory {
    /// Creates an empty memory.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Remembers a message.
    pub fn append<S: Into<String>>(&mut self, role: Role, content: S) {
        self.entries.push(MemoryEntry {
            role,
            content: content.into(),
        });
    }

    /// Returns all remembered messages, oldest first.
    #[inline]
    pub fn entries(&self) -> &[MemoryEntry] {
        &self.entries
    }

    /// Returns the number of remembered messages.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing has been remembered yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn messages(&self) -> impl Iterator<Item = ModelMessage> + '_ {
        self.entries.iter().map(MemoryEntry::to_message)
    }
}
