use std::error::Error as StdError;
use std::fmt::{self, Display};

use parley_model::{ErrorKind as ModelErrorKind, ModelProviderError};

use crate::tool::Error as ToolError;

/// The kind of [`AgentError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AgentErrorKind {
    /// The model request or its response failed.
    Model,
    /// A tool failed to execute.
    Tool,
    /// The model asked for a tool call the agent could not make sense of.
    InvalidToolCall,
}

impl Display for AgentErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentErrorKind::Model => write!(f, "model failure"),
            AgentErrorKind::Tool => write!(f, "tool failure"),
            AgentErrorKind::InvalidToolCall => write!(f, "invalid tool call"),
        }
    }
}

enum Source {
    Model(Box<dyn ModelProviderError>),
    Tool(ToolError),
}

/// An error that aborted an agent run.
pub struct AgentError {
    kind: AgentErrorKind,
    message: String,
    source: Option<Source>,
}

impl AgentError {
    pub(crate) fn model(err: Box<dyn ModelProviderError>) -> Self {
        Self {
            kind: AgentErrorKind::Model,
            message: err.to_string(),
            source: Some(Source::Model(err)),
        }
    }

    pub(crate) fn tool(name: &str, err: ToolError) -> Self {
        Self {
            kind: AgentErrorKind::Tool,
            message: format!("`{name}` failed: {}", err.reason()),
            source: Some(Source::Tool(err)),
        }
    }

    pub(crate) fn invalid_tool_call<S: Into<String>>(message: S) -> Self {
        Self {
            kind: AgentErrorKind::InvalidToolCall,
            message: message.into(),
            source: None,
        }
    }

    /// Returns the kind of this error.
    #[inline]
    pub fn kind(&self) -> AgentErrorKind {
        self.kind
    }

    /// Returns the model error kind if the model failed.
    pub fn model_error_kind(&self) -> Option<ModelErrorKind> {
        match &self.source {
            Some(Source::Model(err)) => Some(err.kind()),
            _ => None,
        }
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Debug for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentError")
            .field("kind", &self.kind)
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

impl Display for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl StdError for AgentError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self.source.as_ref()? {
            Source::Model(err) => Some(err.as_ref()),
            Source::Tool(err) => Some(err),
        }
    }
}
