use std::pin::Pin;
use std::task::{Context, Poll, ready};

use filechat_model::{
    ErrorKind, ModelFinishReason, ModelResponse, ModelResponseEvent,
};
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use pin_project_lite::pin_project;

use crate::Error;
use crate::io::Sse;
use crate::proto::{self, ContentDelta, StreamEvent};

struct PartialState {
    sse: Sse,
    // Recorded from `message_delta`, reported once `message_stop` arrives.
    stop_reason: Option<ModelFinishReason>,
}

type NextEvent = Result<(Option<ModelResponseEvent>, PartialState), Error>;

pin_project! {
    pub struct AnthropicResponse {
        next_event_fut: Option<BoxFuture<'static, NextEvent>>,
    }
}

impl AnthropicResponse {
    #[inline]
    pub fn from_sse(sse: Sse) -> Self {
        let partial_state = PartialState {
            sse,
            stop_reason: None,
        };
        Self {
            next_event_fut: Some(next_event(partial_state).boxed()),
        }
    }
}

impl ModelResponse for AnthropicResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.project();
        let Some(next_event_fut) = this.next_event_fut else {
            return Poll::Ready(Ok(None));
        };
        let (event, partial_state) =
            match ready!(next_event_fut.as_mut().poll(cx)) {
                Ok((Some(event), partial_state)) => (event, partial_state),
                Ok((None, _)) => {
                    *this.next_event_fut = None;
                    return Poll::Ready(Ok(None));
                }
                Err(err) => {
                    *this.next_event_fut = None;
                    return Poll::Ready(Err(err));
                }
            };

        // Nothing follows `message_stop`, so the stream is done after
        // reporting completion.
        *this.next_event_fut = match event {
            ModelResponseEvent::Completed(_) => None,
            ModelResponseEvent::MessageDelta(_) => {
                Some(next_event(partial_state).boxed())
            }
        };

        Poll::Ready(Ok(Some(event)))
    }
}

async fn next_event(mut partial_state: PartialState) -> NextEvent {
    loop {
        let sse_event = match partial_state.sse.next_event().await {
            Ok(Some(event)) => event,
            Ok(None) => {
                debug!("stream ended without `message_stop`");
                return Ok((None, partial_state));
            }
            Err(err) => {
                return Err(Error::new(format!("{err:?}"), ErrorKind::Other));
            }
        };
        trace!("got sse event: {sse_event}");

        let event = serde_json::from_str::<StreamEvent>(&sse_event)
            .map_err(|err| Error::new(format!("{err}"), ErrorKind::Other))?;

        match event {
            StreamEvent::ContentBlockDelta {
                delta: ContentDelta::TextDelta { text },
            } if !text.is_empty() => {
                return Ok((
                    Some(ModelResponseEvent::MessageDelta(text)),
                    partial_state,
                ));
            }
            StreamEvent::MessageDelta { delta } => {
                if let Some(stop_reason) = delta.stop_reason {
                    partial_state.stop_reason =
                        Some(proto::finish_reason(&stop_reason));
                }
            }
            StreamEvent::MessageStop => {
                let reason = partial_state
                    .stop_reason
                    .take()
                    .unwrap_or(ModelFinishReason::EndTurn);
                return Ok((
                    Some(ModelResponseEvent::Completed(reason)),
                    partial_state,
                ));
            }
            StreamEvent::Error { error } => {
                warn!("stream error event: {}", error.r#type);
                return Err(Error::new(
                    error.message,
                    proto::error_kind(&error.r#type),
                ));
            }
            StreamEvent::MessageStart
            | StreamEvent::ContentBlockStart
            | StreamEvent::ContentBlockDelta { .. }
            | StreamEvent::ContentBlockStop
            | StreamEvent::Ping
            | StreamEvent::Unknown => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use std::future::poll_fn;
    use std::pin::pin;

    use bytes::Bytes;
    use filechat_model::ModelProviderError;

    use super::*;
    use crate::io::Chunks;

    const RESPONSE: &[u8] = b"event: message_start
data: {\"type\":\"message_start\",\"message\":{\"id\":\"msg_01\",\"type\":\"message\",\"role\":\"assistant\",\"content\":[]}}

event: content_block_start
data: {\"type\":\"content_block_start\",\"index\":0,\"content_block\":{\"type\":\"text\",\"text\":\"\"}}

event: ping
data: {\"type\": \"ping\"}

event: content_block_delta
data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Hel\"}}

event: content_block_delta
data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"lo\"}}

event: content_block_delta
data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\" world\"}}

event: content_block_stop
data: {\"type\":\"content_block_stop\",\"index\":0}

event: message_delta
data: {\"type\":\"message_delta\",\"delta\":{\"stop_reason\":\"end_turn\",\"stop_sequence\":null},\"usage\":{\"output_tokens\":3}}

event: message_stop
data: {\"type\":\"message_stop\"}

";

    fn response_from(chunks: Vec<Bytes>) -> AnthropicResponse {
        AnthropicResponse::from_sse(Sse::new(Chunks::from_vec_deque(
            chunks.into(),
        )))
    }

    async fn collect(
        resp: AnthropicResponse,
    ) -> (Vec<ModelResponseEvent>, Option<Error>) {
        let mut resp = pin!(resp);
        let mut events = vec![];
        loop {
            match poll_fn(|cx| resp.as_mut().poll_next_event(cx)).await {
                Ok(Some(event)) => events.push(event),
                Ok(None) => return (events, None),
                Err(err) => return (events, Some(err)),
            }
        }
    }

    #[tokio::test]
    async fn test_simple_events() {
        let resp = response_from(vec![Bytes::from_static(RESPONSE)]);
        let (events, err) = collect(resp).await;
        assert!(err.is_none());
        assert_eq!(
            events,
            vec![
                ModelResponseEvent::MessageDelta("Hel".to_owned()),
                ModelResponseEvent::MessageDelta("lo".to_owned()),
                ModelResponseEvent::MessageDelta(" world".to_owned()),
                ModelResponseEvent::Completed(ModelFinishReason::EndTurn),
            ]
        );
    }

    #[tokio::test]
    async fn test_split_chunks() {
        let chunks = RESPONSE
            .chunks(7)
            .map(Bytes::copy_from_slice)
            .collect();
        let (events, err) = collect(response_from(chunks)).await;
        assert!(err.is_none());
        assert_eq!(events.len(), 4);
    }

    #[tokio::test]
    async fn test_error_event() {
        let resp = response_from(vec![
            Bytes::from_static(
                b"event: content_block_delta\ndata: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Hi\"}}\n\n",
            ),
            Bytes::from_static(
                b"event: error\ndata: {\"type\":\"error\",\"error\":{\"type\":\"overloaded_error\",\"message\":\"Overloaded\"}}\n\n",
            ),
        ]);
        let (events, err) = collect(resp).await;
        assert_eq!(events.len(), 1);
        let err = err.unwrap();
        assert_eq!(err.kind(), ErrorKind::RateLimitExceeded);
        assert_eq!(err.message(), "Overloaded");
    }

    #[tokio::test]
    async fn test_malformed_payload() {
        let resp =
            response_from(vec![Bytes::from_static(b"data: not json\n\n")]);
        let (events, err) = collect(resp).await;
        assert!(events.is_empty());
        assert_eq!(err.unwrap().kind(), ErrorKind::Other);
    }
}
