use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use parley_model::{
    ErrorKind, ModelFinishReason, ModelResponse, ModelResponseEvent,
    OpaqueMessage, ToolCallRequest,
};
use pin_project_lite::pin_project;
use serde_json::Value;

use crate::Error;
use crate::io::Sse;
use crate::proto::{ChatCompletionChunk, Delta, Message, ToolCall};

/// Everything received so far, carried from one event future to the next.
struct Progress {
    sse: Sse,
    id: Option<String>,
    content: String,
    reasoning_content: Option<String>,
    tool_calls: Vec<ToolCall>,
    // Events decoded from the stream but not handed out yet. A single chunk
    // may carry text, tool calls and a finish reason at once.
    ready_events: VecDeque<ModelResponseEvent>,
    // Tool calls arrive in pieces, so they are only emitted once the model
    // says it is done with them.
    finished: bool,
}

impl Progress {
    fn into_message(self) -> Option<(String, Message)> {
        let content = (!self.content.is_empty()).then_some(self.content);
        let tool_calls = (!self.tool_calls.is_empty()).then_some(self.tool_calls);
        Some((
            self.id?,
            Message::Assistant {
                content,
                tool_calls,
                reasoning_content: self.reasoning_content,
            },
        ))
    }

    fn apply_delta(&mut self, delta: Delta) {
        if let Some(content) = delta.content.filter(|c| !c.is_empty()) {
            self.content.push_str(&content);
            self.ready_events
                .push_back(ModelResponseEvent::MessageDelta(content));
        }
        if let Some(reasoning) = delta.reasoning_content {
            self.reasoning_content
                .get_or_insert_default()
                .push_str(&reasoning);
        }
        for piece in delta.tool_calls.into_iter().flatten() {
            self.merge_tool_call(piece);
        }
    }

    fn merge_tool_call(&mut self, piece: ToolCall) {
        let Some(partial) = self
            .tool_calls
            .iter_mut()
            .find(|call| call.index == piece.index)
        else {
            self.tool_calls.push(piece);
            return;
        };
        if let Some(id) = piece.id {
            partial.id.get_or_insert_default().push_str(&id);
        }
        if let Some(ty) = piece.r#type {
            partial.r#type.get_or_insert_default().push_str(&ty);
        }
        let Some(function) = piece.function else {
            return;
        };
        match &mut partial.function {
            Some(partial_fn) => {
                if let Some(name) = function.name {
                    partial_fn.name.get_or_insert_default().push_str(&name);
                }
                if let Some(arguments) = function.arguments {
                    partial_fn
                        .arguments
                        .get_or_insert_default()
                        .push_str(&arguments);
                }
            }
            None => partial.function = Some(function),
        }
    }

    fn finish(&mut self, reason: ModelFinishReason) {
        if self.finished {
            return;
        }
        self.finished = true;
        for call in &self.tool_calls {
            self.ready_events
                .push_back(ModelResponseEvent::ToolCall(to_request(call)));
        }
        self.ready_events
            .push_back(ModelResponseEvent::Completed(reason));
    }
}

fn to_request(call: &ToolCall) -> ToolCallRequest {
    let function = call.function.as_ref();
    let name = function
        .and_then(|f| f.name.clone())
        .unwrap_or_default();
    let raw_args = function
        .and_then(|f| f.arguments.as_deref())
        .unwrap_or_default();
    let arguments = if raw_args.trim().is_empty() {
        Value::Object(Default::default())
    } else {
        // Keep malformed arguments as a string so the caller can report it.
        serde_json::from_str(raw_args)
            .unwrap_or_else(|_| Value::String(raw_args.to_owned()))
    };
    ToolCallRequest {
        id: call.id.clone().unwrap_or_default(),
        name,
        arguments,
    }
}

fn parse_finish_reason(reason: &str) -> ModelFinishReason {
    match reason {
        "tool_calls" | "function_call" => ModelFinishReason::ToolCalls,
        _ => ModelFinishReason::Stop,
    }
}

type PinnedFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
type NextEvent = Result<(Option<ModelResponseEvent>, Progress), Error>;

pin_project! {
    /// A streamed chat completion.
    pub struct OpenAIResponse {
        next_event_fut: Option<PinnedFuture<NextEvent>>,
        full_msg: Option<(String, Message)>,
    }
}

impl OpenAIResponse {
    pub fn from_sse(sse: Sse) -> Self {
        let progress = Progress {
            sse,
            id: None,
            content: String::new(),
            reasoning_content: None,
            tool_calls: vec![],
            ready_events: VecDeque::new(),
            finished: false,
        };
        Self {
            next_event_fut: Some(Box::pin(next_event(progress))),
            full_msg: None,
        }
    }
}

impl ModelResponse for OpenAIResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.project();
        let Some(next_event_fut) = this.next_event_fut else {
            return Poll::Ready(Ok(None));
        };
        match ready!(next_event_fut.as_mut().poll(cx)) {
            Ok((Some(event), progress)) => {
                *this.next_event_fut = Some(Box::pin(next_event(progress)));
                Poll::Ready(Ok(Some(event)))
            }
            Ok((None, progress)) => {
                *this.next_event_fut = None;
                *this.full_msg = progress.into_message();
                Poll::Ready(Ok(None))
            }
            Err(err) => {
                *this.next_event_fut = None;
                Poll::Ready(Err(err))
            }
        }
    }

    fn make_opaque_message(&self) -> Option<OpaqueMessage> {
        self.full_msg
            .as_ref()
            .map(|(id, msg)| OpaqueMessage::new(id.clone(), msg.clone()))
    }
}

async fn next_event(mut progress: Progress) -> NextEvent {
    loop {
        if let Some(event) = progress.ready_events.pop_front() {
            return Ok((Some(event), progress));
        }

        let payload = match progress.sse.next_event().await {
            Ok(Some(payload)) => payload,
            Ok(None) => break,
            Err(err) => {
                return Err(Error::new(
                    format!("broken event stream: {err:?}"),
                    ErrorKind::Unavailable,
                ));
            }
        };
        trace!("got sse payload: {payload}");
        if payload == "[DONE]" {
            break;
        }

        let chunk = serde_json::from_str::<ChatCompletionChunk>(&payload)
            .map_err(|err| {
                Error::new(format!("{err}"), ErrorKind::InvalidResponse)
            })?;
        if progress.id.get_or_insert_with(|| chunk.id.clone()) != &chunk.id {
            return Err(Error::new(
                "chunk id mismatch",
                ErrorKind::InvalidResponse,
            ));
        }

        // Usage-only chunks have no choices.
        for choice in chunk.choices {
            progress.apply_delta(choice.delta);
            if let Some(reason) = choice.finish_reason {
                progress.finish(parse_finish_reason(&reason));
            }
        }
    }

    // Some servers close the stream without a finish reason.
    if !progress.finished {
        let reason = if progress.tool_calls.is_empty() {
            ModelFinishReason::Stop
        } else {
            ModelFinishReason::ToolCalls
        };
        progress.finish(reason);
    }
    let event = progress.ready_events.pop_front();
    Ok((event, progress))
}
