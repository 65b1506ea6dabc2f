use std::error::Error as StdError;
use std::fmt::{self, Display};

use parley_core::AgentError;

use crate::config::ConfigError;

/// An error returned by a [`Session`](crate::Session).
#[derive(Debug)]
pub enum Error {
    /// The agent could not be configured.
    Configuration(ConfigError),
    /// The agent failed to answer.
    AgentInvocation(AgentError),
    /// The submitted text is blank.
    EmptyInput,
    /// Input was submitted before the session was initialized.
    NotInitialized,
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Configuration(err) => write!(f, "configuration error: {err}"),
            Error::AgentInvocation(err) => write!(f, "agent error: {err}"),
            Error::EmptyInput => write!(f, "input is empty"),
            Error::NotInitialized => write!(f, "session is not initialized"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Configuration(err) => Some(err),
            Error::AgentInvocation(err) => Some(err),
            Error::EmptyInput | Error::NotInitialized => None,
        }
    }
}

impl From<ConfigError> for Error {
    #[inline]
    fn from(err: ConfigError) -> Self {
        Error::Configuration(err)
    }
}

impl From<AgentError> for Error {
    #[inline]
    fn from(err: AgentError) -> Self {
        Error::AgentInvocation(err)
    }
}
