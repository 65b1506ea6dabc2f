use std::future::poll_fn;
use std::pin::{Pin, pin};
use std::sync::Arc;

use parley_model::{
    ModelFinishReason, ModelMessage, ModelProvider, ModelProviderError,
    ModelRequest, ModelResponse, ModelResponseEvent, OpaqueMessage,
    ToolCallRequest,
};
use tracing::Instrument;

pub type SendRequestResult =
    Result<ModelClientResponse, Box<dyn ModelProviderError>>;
type BoxedSendRequestFuture<'a> =
    Pin<Box<dyn Future<Output = SendRequestResult> + Send + 'a>>;
type DeltaFn<'a> = dyn FnMut(String) + Send + 'a;

/// A wrapper around a model provider that erases its concrete type, so the
/// agent does not need a generic parameter for it.
#[derive(Clone)]
pub struct ModelClient {
    provider: Arc<dyn ErasedProvider>,
}

impl ModelClient {
    #[inline]
    pub fn new<P: ModelProvider + 'static>(provider: P) -> Self {
        Self {
            provider: Arc::new(provider),
        }
    }

    /// Sends a request and collects the whole response.
    ///
    /// Every text delta is passed to `on_delta` as soon as it arrives.
    #[inline]
    pub async fn send_request(
        &self,
        req: ModelRequest,
        on_delta: &mut DeltaFn<'_>,
    ) -> SendRequestResult {
        self.provider.send(req, on_delta).await
    }
}

trait ErasedProvider: Send + Sync {
    fn send<'a>(
        &'a self,
        req: ModelRequest,
        on_delta: &'a mut DeltaFn<'_>,
    ) -> BoxedSendRequestFuture<'a>;
}

impl<P: ModelProvider + 'static> ErasedProvider for P {
    fn send<'a>(
        &'a self,
        req: ModelRequest,
        on_delta: &'a mut DeltaFn<'_>,
    ) -> BoxedSendRequestFuture<'a> {
        trace!("got a request: {req:?}");
        let fut = self.send_request(&req);
        Box::pin(
            async move {
                let resp = fut.await.map_err(|err| {
                    error!("model request failed: {err}");
                    Box::new(err) as Box<dyn ModelProviderError>
                })?;
                collect_response::<P>(resp, on_delta).await
            }
            .instrument(trace_span!("model client req")),
        )
    }
}

/// A completely received response from the model client.
#[derive(Clone, Debug)]
pub struct ModelClientResponse {
    /// The assistant text.
    pub transcript: String,
    pub opaque_msg: Option<OpaqueMessage>,
    /// Tool calls requested by the model.
    pub tool_calls: Vec<ToolCallRequest>,
    /// The reason the model finished generating.
    pub finish_reason: Option<ModelFinishReason>,
}

impl ModelClientResponse {
    /// Returns the message to put back into the next request.
    ///
    /// Falls back to a plain text message when the provider gives no
    /// opaque message.
    pub fn history_message(&self) -> ModelMessage {
        match &self.opaque_msg {
            Some(msg) => ModelMessage::Opaque(msg.clone()),
            None => ModelMessage::Assistant(self.transcript.clone()),
        }
    }
}

async fn collect_response<P: ModelProvider + 'static>(
    resp: P::Response,
    on_delta: &mut DeltaFn<'_>,
) -> SendRequestResult {
    let mut transcript = String::new();
    let mut tool_calls = Vec::new();
    let mut finish_reason = None;

    let mut resp = pin!(resp);
    loop {
        let event = poll_fn(|cx| resp.as_mut().poll_next_event(cx))
            .await
            .map_err(|err| {
                error!("model response failed: {err}");
                Box::new(err) as Box<dyn ModelProviderError>
            })?;
        let Some(event) = event else {
            break;
        };
        trace!("got an event: {event:?}");

        match event {
            ModelResponseEvent::MessageDelta(delta) => {
                transcript.push_str(&delta);
                on_delta(delta);
            }
            ModelResponseEvent::ToolCall(req) => tool_calls.push(req),
            ModelResponseEvent::Completed(reason) => {
                finish_reason = Some(reason);
            }
        }
    }
    trace!("finished a request");

    Ok(ModelClientResponse {
        transcript,
        opaque_msg: resp.make_opaque_message(),
        tool_calls,
        finish_reason,
    })
}

#[cfg(test)]
mod tests {
    use parley_model::ErrorKind;
    use parley_test_model::{PresetEvent, PresetResponse, TestModelProvider};

    use super::*;

    fn request() -> ModelRequest {
        ModelRequest {
            messages: vec![ModelMessage::User("Hi".to_owned())],
            tools: vec![],
        }
    }

    #[tokio::test]
    async fn test_send_request() {
        let model_provider = TestModelProvider::default();
        for _ in 0..3 {
            model_provider.push_response(PresetResponse::with_events([
                PresetEvent::MessageDelta("How ".to_owned()),
                PresetEvent::MessageDelta("are ".to_owned()),
                PresetEvent::MessageDelta("you?".to_owned()),
            ]));
        }
        let model_client = ModelClient::new(model_provider);

        for _ in 0..3 {
            let mut deltas = vec![];
            let resp = model_client
                .send_request(request(), &mut |delta| deltas.push(delta))
                .await
                .unwrap();
            assert_eq!(resp.transcript, "How are you?");
            assert_eq!(deltas, vec!["How ", "are ", "you?"]);
            assert_eq!(resp.finish_reason, Some(ModelFinishReason::Stop));
            assert!(matches!(resp.history_message(), ModelMessage::Opaque(_)));
        }
    }

    #[tokio::test]
    async fn test_error_handling() {
        let model_provider = TestModelProvider::default();
        model_provider.push_response(PresetResponse::failing(ErrorKind::Moderated));
        let model_client = ModelClient::new(model_provider);

        let err = model_client
            .send_request(request(), &mut |_| {})
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Moderated);
    }
}
