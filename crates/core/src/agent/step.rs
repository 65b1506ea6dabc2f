use std::io;

use serde_json::Value;

/// An intermediate event of an agent run.
///
/// Step events are meant for a live display of what the agent is doing.
/// They carry no information that is needed to get the final answer.
#[derive(Clone, Debug, PartialEq)]
pub enum StepEvent {
    /// The model has been asked for its next move.
    Thinking,
    /// A piece of text streamed by the model.
    Token(String),
    /// A tool is about to run with the given input.
    ToolStarted {
        /// Name of the tool.
        name: String,
        /// Arguments passed to the tool.
        input: Value,
    },
    /// A tool returned its output.
    ToolFinished {
        /// Name of the tool.
        name: String,
        /// What the tool returned.
        output: String,
    },
    /// A tool failed.
    ToolFailed {
        /// Name of the tool.
        name: String,
        /// Why it failed.
        reason: String,
    },
    /// The agent has its final answer.
    Finished,
}

/// Receives step events while an agent runs.
///
/// Errors returned from [`on_step`](StepSink::on_step) are logged and
/// otherwise ignored, they never abort the run.
pub trait StepSink: Send + Sync {
    /// Handles one step event.
    fn on_step(&self, event: &StepEvent) -> io::Result<()>;
}

impl<F> StepSink for F
where
    F: Fn(&StepEvent) -> io::Result<()> + Send + Sync,
{
    #[inline]
    fn on_step(&self, event: &StepEvent) -> io::Result<()> {
        self(event)
    }
}

/// Discards every event.
impl StepSink for () {
    #[inline]
    fn on_step(&self, _event: &StepEvent) -> io::Result<()> {
        Ok(())
    }
}

pub(super) fn notify(sink: &dyn StepSink, event: StepEvent) {
    if let Err(err) = sink.on_step(&event) {
        warn!("failed to display step {event:?}: {err}");
    }
}
