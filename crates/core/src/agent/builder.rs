use parley_model::ModelProvider;

use super::Agent;
use crate::memory::ConversationMemory;
use crate::model_client::ModelClient;
use crate::tool::{AnyTool, Tool, Toolbox};

const DEFAULT_MAX_ITERATIONS: usize = 15;

/// [`Agent`] builder.
pub struct AgentBuilder {
    model_client: ModelClient,
    toolbox: Toolbox,
    memory: ConversationMemory,
    system_prompt: Option<String>,
    max_iterations: usize,
}

impl AgentBuilder {
    /// Creates a new builder with the specified model provider.
    #[inline]
    pub fn with_model_provider<P: ModelProvider + 'static>(
        provider: P,
    ) -> Self {
        Self {
            model_client: ModelClient::new(provider),
            toolbox: Toolbox::default(),
            memory: ConversationMemory::new(),
            system_prompt: None,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Sets the system prompt for the agent.
    #[inline]
    pub fn with_system_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Starts the agent with an existing memory instead of an empty one.
    #[inline]
    pub fn with_memory(mut self, memory: ConversationMemory) -> Self {
        self.memory = memory;
        self
    }

    /// Sets how many times the model may be asked within one run before the
    /// agent gives up. Defaults to 15, and is at least 1.
    #[inline]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    /// Registers a tool.
    #[inline]
    pub fn with_tool<T: Tool>(mut self, tool: T) -> Self {
        self.toolbox.add(Box::new(AnyTool(tool)));
        self
    }

    /// Builds the agent.
    pub fn build(self) -> Agent {
        Agent {
            model_client: self.model_client,
            toolbox: self.toolbox,
            memory: self.memory,
            system_prompt: self.system_prompt,
            max_iterations: self.max_iterations,
        }
    }
}
