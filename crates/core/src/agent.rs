mod builder;
mod error;
mod step;

use async_trait::async_trait;
use parley_model::{
    ModelMessage, ModelRequest, ToolCallRequest, ToolCallResult,
};
use tracing::Instrument;

use crate::memory::{ConversationMemory, Role};
use crate::model_client::ModelClient;
use crate::tool::{ErrorKind as ToolErrorKind, Toolbox};
pub use builder::AgentBuilder;
pub use error::{AgentError, AgentErrorKind};
use step::notify;
pub use step::{StepEvent, StepSink};

/// The answer given when the agent runs out of iterations.
pub const ITERATION_LIMIT_ANSWER: &str =
    "Agent stopped due to iteration limit or time limit.";

/// Something that turns a user utterance into a final answer.
#[async_trait]
pub trait Executor: Send {
    /// Runs one user input to completion.
    ///
    /// Intermediate steps are reported to `sink`, the final answer is
    /// returned.
    async fn run(
        &mut self,
        input: &str,
        sink: &dyn StepSink,
    ) -> Result<String, AgentError>;
}

/// A tool-calling agent bound to one model, a fixed set of tools and its
/// own conversational memory.
///
/// Each [`run`](Agent::run) asks the model for a move, executes the tools
/// it requests and feeds their outputs back, until the model answers in
/// plain text. The user input and that answer are then remembered, so the
/// next run sees the conversation so far. A failed run leaves the memory
/// untouched.
pub struct Agent {
    model_client: ModelClient,
    toolbox: Toolbox,
    memory: ConversationMemory,
    system_prompt: Option<String>,
    max_iterations: usize,
}

impl Agent {
    /// Returns the conversational memory of this agent.
    #[inline]
    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    /// Returns the names of the tools bound to this agent.
    #[inline]
    pub fn tool_names(&self) -> Vec<&str> {
        self.toolbox.names()
    }

    /// Runs one user input to completion.
    pub async fn run(
        &mut self,
        input: &str,
        sink: &dyn StepSink,
    ) -> Result<String, AgentError> {
        let answer = self
            .run_steps(input, sink)
            .instrument(debug_span!("agent run"))
            .await?;
        notify(sink, StepEvent::Finished);

        self.memory.append(Role::User, input);
        self.memory.append(Role::Assistant, answer.as_str());
        Ok(answer)
    }

    async fn run_steps(
        &self,
        input: &str,
        sink: &dyn StepSink,
    ) -> Result<String, AgentError> {
        let mut scratchpad = vec![];
        for iteration in 0..self.max_iterations {
            debug!("iteration {iteration}");
            notify(sink, StepEvent::Thinking);

            let request = self.build_request(input, &scratchpad);
            let resp = self
                .model_client
                .send_request(request, &mut |delta| {
                    notify(sink, StepEvent::Token(delta))
                })
                .await
                .map_err(AgentError::model)?;
            debug!(
                "model finished with {:?}, {} tool calls",
                resp.finish_reason,
                resp.tool_calls.len()
            );

            if resp.tool_calls.is_empty() {
                return Ok(resp.transcript);
            }

            scratchpad.push(resp.history_message());
            for call in resp.tool_calls {
                let id = call.id.clone();
                let content = self.call_tool(call, sink).await?;
                scratchpad.push(ModelMessage::Tool(ToolCallResult { id, content }));
            }
        }

        warn!("no answer after {} iterations", self.max_iterations);
        Ok(ITERATION_LIMIT_ANSWER.to_owned())
    }

    fn build_request(
        &self,
        input: &str,
        scratchpad: &[ModelMessage],
    ) -> ModelRequest {
        let mut messages = Vec::with_capacity(
            self.memory.len() + scratchpad.len() + 2,
        );
        if let Some(prompt) = &self.system_prompt {
            messages.push(ModelMessage::System(prompt.clone()));
        }
        messages.extend(self.memory.messages());
        messages.push(ModelMessage::User(input.to_owned()));
        messages.extend_from_slice(scratchpad);

        ModelRequest {
            messages,
            tools: self.toolbox.definitions(),
        }
    }

    async fn call_tool(
        &self,
        call: ToolCallRequest,
        sink: &dyn StepSink,
    ) -> Result<String, AgentError> {
        let ToolCallRequest {
            name, arguments, ..
        } = call;
        if !arguments.is_object() {
            return Err(AgentError::invalid_tool_call(format!(
                "arguments for `{name}` are not a JSON object: {arguments}"
            )));
        }

        notify(
            sink,
            StepEvent::ToolStarted {
                name: name.clone(),
                input: arguments.clone(),
            },
        );
        let Some(fut) = self.toolbox.execute(&name, arguments) else {
            let output = format!(
                "{name} is not a valid tool, try one of [{}].",
                self.toolbox.names().join(", ")
            );
            notify(sink, StepEvent::ToolFinished { name, output: output.clone() });
            return Ok(output);
        };

        match fut.await {
            Ok(output) => {
                notify(sink, StepEvent::ToolFinished { name, output: output.clone() });
                Ok(output)
            }
            Err(err) => {
                notify(
                    sink,
                    StepEvent::ToolFailed {
                        name: name.clone(),
                        reason: err.reason().into_owned(),
                    },
                );
                if err.kind() == ToolErrorKind::InvalidInput {
                    return Err(AgentError::invalid_tool_call(format!(
                        "bad input for `{name}`: {}",
                        err.reason()
                    )));
                }
                Err(AgentError::tool(&name, err))
            }
        }
    }
}

#[async_trait]
impl Executor for Agent {
    #[inline]
    async fn run(
        &mut self,
        input: &str,
        sink: &dyn StepSink,
    ) -> Result<String, AgentError> {
        Agent::run(self, input, sink).await
    }
}
