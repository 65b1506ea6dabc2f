use parley_core::{Agent, AgentBuilder, Executor, StepSink};
use parley_openai_model::OpenAIProvider;

use crate::config::Settings;
use crate::error::Error;
use crate::tools::{WebSearchTool, WikipediaTool, http_client};
use crate::transcript::{Transcript, Turn};

const SYSTEM_PROMPT: &str = include_str!("./system_prompt.md");

/// Where a session shows its messages.
pub trait ChatView {
    /// Shows one turn, tagged by its role.
    fn show_turn(&mut self, turn: &Turn);

    /// Opens the live region that displays the steps of an agent run.
    fn live_steps(&mut self) -> &dyn StepSink;

    /// Closes the live region opened by [`live_steps`](ChatView::live_steps).
    fn finish_steps(&mut self);
}

/// A chat session: a transcript of what has been said and the agent that
/// answers.
///
/// The agent is created once by [`initialize`](Session::initialize) and
/// reused for every turn. It keeps its own memory, the transcript is only
/// what the session displays.
pub struct Session<A = Agent> {
    transcript: Transcript,
    agent: Option<A>,
}

impl<A> Default for Session<A> {
    #[inline]
    fn default() -> Self {
        Self {
            transcript: Transcript::default(),
            agent: None,
        }
    }
}

impl Session<Agent> {
    /// Creates the agent from the environment if there is none yet.
    ///
    /// The session stays uninitialized when the settings are incomplete.
    pub fn initialize(&mut self) -> Result<(), Error> {
        self.initialize_with(|| {
            let settings = Settings::from_env()?;
            Ok(build_agent(&settings))
        })
    }
}

impl<A: Executor> Session<A> {
    /// Creates an uninitialized session with an empty transcript.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the agent with `factory` if there is none yet.
    ///
    /// `factory` is not called when the session already has an agent.
    pub fn initialize_with<F>(&mut self, factory: F) -> Result<(), Error>
    where
        F: FnOnce() -> Result<A, Error>,
    {
        if self.agent.is_some() {
            trace!("session already initialized");
            return Ok(());
        }
        let agent = factory().inspect_err(|err| {
            error!("failed to create the agent: {err}");
        })?;
        self.agent = Some(agent);
        info!("session initialized");
        Ok(())
    }

    /// Returns `true` if the session has an agent.
    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.agent.is_some()
    }

    /// Returns the agent, if created.
    #[inline]
    pub fn agent(&self) -> Option<&A> {
        self.agent.as_ref()
    }

    /// Returns the turns said so far.
    #[inline]
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Shows every recorded turn in order.
    pub fn render_history(&self, view: &mut dyn ChatView) {
        for turn in self.transcript.turns() {
            view.show_turn(turn);
        }
    }

    /// Records `text` as a user turn, asks the agent and records its answer.
    ///
    /// Both turns are shown on `view` as they are recorded, and the steps
    /// of the agent are shown in its live region. If the agent fails, the
    /// user turn stays in the transcript without an answer.
    pub async fn submit(
        &mut self,
        text: &str,
        view: &mut dyn ChatView,
    ) -> Result<&str, Error> {
        if text.trim().is_empty() {
            return Err(Error::EmptyInput);
        }
        let Some(agent) = self.agent.as_mut() else {
            return Err(Error::NotInitialized);
        };

        view.show_turn(self.transcript.push(Turn::user(text)));

        let result = agent.run(text, view.live_steps()).await;
        view.finish_steps();
        let answer = result.inspect_err(|err| {
            error!("agent failed: {err}");
        })?;

        let turn = self.transcript.push(Turn::assistant(answer));
        view.show_turn(turn);
        Ok(&turn.content)
    }
}

/// Builds the chat agent: the configured model with web search and
/// Wikipedia lookup, starting with an empty memory.
pub fn build_agent(settings: &Settings) -> Agent {
    let provider = OpenAIProvider::new(settings.provider_config());
    let client = http_client();
    AgentBuilder::with_model_provider(provider)
        .with_system_prompt(SYSTEM_PROMPT.trim())
        .with_tool(WebSearchTool::new(client.clone()))
        .with_tool(WikipediaTool::new(client))
        .build()
}

#[cfg(test)]
mod tests;
