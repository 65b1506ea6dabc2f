use std::io;
use std::sync::Mutex;

use async_trait::async_trait;
use parley_core::{
    AgentBuilder, AgentError, AgentErrorKind, Executor, Role, StepEvent,
    StepSink,
};
use parley_model::{ErrorKind, ModelMessage, ToolCallRequest};
use parley_test_model::{PresetEvent, PresetResponse, TestModelProvider};
use serde_json::json;

use super::*;
use crate::config::{ConfigError, MODEL_NAME};
use crate::tools::WikipediaTool;

#[derive(Default)]
struct RecordingSink(Mutex<Vec<StepEvent>>);

impl StepSink for RecordingSink {
    fn on_step(&self, event: &StepEvent) -> io::Result<()> {
        self.0.lock().unwrap().push(event.clone());
        Ok(())
    }
}

#[derive(Default)]
struct RecordingView {
    shown: Vec<Turn>,
    steps: RecordingSink,
    live_regions: usize,
    open: bool,
}

impl ChatView for RecordingView {
    fn show_turn(&mut self, turn: &Turn) {
        assert!(!self.open, "turn shown inside the live region");
        self.shown.push(turn.clone());
    }

    fn live_steps(&mut self) -> &dyn StepSink {
        self.live_regions += 1;
        self.open = true;
        &self.steps
    }

    fn finish_steps(&mut self) {
        self.open = false;
    }
}

impl RecordingView {
    fn steps(&self) -> Vec<StepEvent> {
        self.steps.0.lock().unwrap().clone()
    }
}

struct FixedAnswer {
    answer: &'static str,
    inputs: Vec<String>,
}

impl FixedAnswer {
    fn new(answer: &'static str) -> Self {
        Self {
            answer,
            inputs: vec![],
        }
    }
}

#[async_trait]
impl Executor for FixedAnswer {
    async fn run(
        &mut self,
        input: &str,
        sink: &dyn StepSink,
    ) -> Result<String, AgentError> {
        self.inputs.push(input.to_owned());
        sink.on_step(&StepEvent::Finished).ok();
        Ok(self.answer.to_owned())
    }
}

fn session_with(answer: &'static str) -> Session<FixedAnswer> {
    let mut session = Session::new();
    session
        .initialize_with(|| Ok(FixedAnswer::new(answer)))
        .unwrap();
    session
}

#[tokio::test]
async fn test_capital_of_france() {
    let mut session = session_with("Paris");
    let mut view = RecordingView::default();

    let answer = session
        .submit("What is the capital of France?", &mut view)
        .await
        .unwrap();
    assert_eq!(answer, "Paris");

    let expected = vec![
        Turn::user("What is the capital of France?"),
        Turn::assistant("Paris"),
    ];
    assert_eq!(session.transcript().turns(), expected);
    assert_eq!(view.shown, expected);
    assert_eq!(view.steps(), vec![StepEvent::Finished]);
    assert_eq!(
        session.agent().unwrap().inputs,
        vec!["What is the capital of France?"]
    );
}

#[tokio::test]
async fn test_turns_alternate() {
    let mut session = session_with("Sure.");
    let mut view = RecordingView::default();

    for i in 0..3 {
        session
            .submit(&format!("Question {i}"), &mut view)
            .await
            .unwrap();
    }

    let turns = session.transcript().turns();
    assert_eq!(turns.len(), 6);
    for (i, turn) in turns.iter().enumerate() {
        let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
        assert_eq!(turn.role, role);
    }
    assert_eq!(view.live_regions, 3);
}

#[test]
fn test_initialize_once() {
    let mut session = Session::<FixedAnswer>::new();
    assert!(!session.is_initialized());

    let mut constructed = 0;
    for _ in 0..2 {
        session
            .initialize_with(|| {
                constructed += 1;
                Ok(FixedAnswer::new("Hi"))
            })
            .unwrap();
    }
    assert_eq!(constructed, 1);
    assert!(session.is_initialized());
}

#[tokio::test]
async fn test_render_history() {
    let mut session = session_with("Hello!");
    session
        .submit("Hi", &mut RecordingView::default())
        .await
        .unwrap();
    let before = session.transcript().clone();

    let mut first = RecordingView::default();
    let mut second = RecordingView::default();
    session.render_history(&mut first);
    session.render_history(&mut second);

    assert_eq!(first.shown, second.shown);
    assert_eq!(first.shown, before.turns());
    assert_eq!(session.transcript(), &before);
}

#[tokio::test]
async fn test_rejected_input() {
    let mut view = RecordingView::default();

    let mut session = Session::<FixedAnswer>::new();
    let err = session.submit("Hello", &mut view).await.unwrap_err();
    assert!(matches!(err, Error::NotInitialized));

    let mut session = session_with("Hello!");
    let err = session.submit("  \n", &mut view).await.unwrap_err();
    assert!(matches!(err, Error::EmptyInput));

    assert!(session.transcript().is_empty());
    assert!(view.shown.is_empty());
}

#[test]
fn test_missing_model_name() {
    let mut session = Session::<Agent>::new();
    let err = session
        .initialize_with(|| {
            let settings = Settings::from_lookup(|name| match name {
                "MODEL_NAME" => Some(String::new()),
                "MODEL_TEMPERATURE" => Some("0.5".to_owned()),
                "OPENAI_API_KEY" => Some("sk-test".to_owned()),
                _ => None,
            })?;
            Ok(build_agent(&settings))
        })
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Configuration(ConfigError::Missing(MODEL_NAME))
    ));
    assert!(!session.is_initialized());
}

#[tokio::test]
async fn test_agent_failure() {
    let provider = TestModelProvider::default();
    provider.push_response(PresetResponse::text("Bonjour!"));
    provider.push_response(PresetResponse::failing(ErrorKind::Unavailable));

    let mut session = Session::new();
    session
        .initialize_with(|| {
            Ok(AgentBuilder::with_model_provider(provider.clone()).build())
        })
        .unwrap();
    let mut view = RecordingView::default();

    session.submit("Hi", &mut view).await.unwrap();
    let err = session.submit("Still there?", &mut view).await.unwrap_err();
    let Error::AgentInvocation(err) = err else {
        panic!("expected an agent error, got {err:?}");
    };
    assert_eq!(err.kind(), AgentErrorKind::Model);

    let turns = session.transcript().turns();
    assert_eq!(turns.len(), 3);
    assert_eq!(turns[2], Turn::user("Still there?"));
    assert!(!view.open);

    // The agent only remembers the turn it answered.
    assert_eq!(session.agent().unwrap().memory().len(), 2);
}

#[tokio::test]
async fn test_agent_steps_reach_view() {
    let provider = TestModelProvider::default();
    provider.push_response(PresetResponse::text("Paris is the capital."));

    let mut session = Session::new();
    session
        .initialize_with(|| {
            Ok(AgentBuilder::with_model_provider(provider).build())
        })
        .unwrap();
    let mut view = RecordingView::default();

    session.submit("Capital of France?", &mut view).await.unwrap();

    let steps = view.steps();
    assert_eq!(steps.first(), Some(&StepEvent::Thinking));
    assert!(steps.contains(&StepEvent::Token("capital.".to_owned())));
    assert_eq!(steps.last(), Some(&StepEvent::Finished));
    assert_eq!(
        session.transcript().last(),
        Some(&Turn::assistant("Paris is the capital."))
    );
}

#[tokio::test]
async fn test_blank_tool_query_keeps_turn() {
    let provider = TestModelProvider::default();
    provider.push_response(PresetResponse::with_events([
        PresetEvent::ToolCall(ToolCallRequest {
            id: "call_1".to_owned(),
            name: "wikipedia".to_owned(),
            arguments: json!({ "query": "  " }),
        }),
    ]));
    provider.push_response(PresetResponse::text("I could not find anything."));

    let mut session = Session::new();
    session
        .initialize_with(|| {
            Ok(AgentBuilder::with_model_provider(provider.clone())
                .with_tool(WikipediaTool::new(reqwest::Client::new()))
                .build())
        })
        .unwrap();
    let mut view = RecordingView::default();

    let answer = session.submit("Look it up", &mut view).await.unwrap();
    assert_eq!(answer, "I could not find anything.");
    assert_eq!(session.transcript().len(), 2);

    let requests = provider.requests();
    let Some(ModelMessage::Tool(result)) = requests[1].messages.last() else {
        panic!("expected a tool result");
    };
    assert_eq!(result.content, "No good Wikipedia Search Result was found");
}
