//! A local fake model for testing purpose.

mod preset;

use std::collections::VecDeque;
use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll, ready};
use std::time::Duration;

use filechat_model::{
    ErrorKind, ModelFinishReason, ModelProvider, ModelProviderError,
    ModelRequest, ModelResponse, ModelResponseEvent,
};
use tokio::time::{Sleep, sleep};

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    message: &'static str,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

pub struct TestModelResponse {
    events: Vec<PresetEvent>,
    event_idx: usize,
    delay: Duration,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl ModelResponse for TestModelResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        // SAFETY: This type does not require to be pinned.
        let this = unsafe { self.get_unchecked_mut() };

        if let Some(sleep) = &mut this.sleep {
            let sleep = sleep.as_mut();
            ready!(sleep.poll(cx));
            this.sleep = None;

            if this.event_idx < this.events.len() {
                let event = match &this.events[this.event_idx] {
                    PresetEvent::MessageDelta(msg) => {
                        ModelResponseEvent::MessageDelta(msg.clone())
                    }
                    PresetEvent::Failure(kind) => {
                        // Nothing can be pulled after a failure.
                        this.event_idx = this.events.len() + 1;
                        return Poll::Ready(Err(Error {
                            message: "preset stream failure",
                            kind: *kind,
                        }));
                    }
                };
                this.event_idx += 1;
                return Poll::Ready(Ok(Some(event)));
            } else if this.event_idx == this.events.len() {
                this.event_idx += 1;
                return Poll::Ready(Ok(Some(ModelResponseEvent::Completed(
                    ModelFinishReason::EndTurn,
                ))));
            } else {
                // In case this method is called after completion.
                return Poll::Ready(Ok(None));
            }
        }
        this.sleep = Some(Box::pin(sleep(this.delay)));
        Pin::new(this).poll_next_event(cx)
    }
}

/// A local fake model for testing purpose.
///
/// Before sending requests, you need to queue the preset responses. Each
/// request consumes the oldest queued response; if nothing is queued, the
/// request fails. Every request received is recorded so tests can inspect
/// the exact payload that would have gone over the wire.
///
/// Clones share the same queue and request log.
#[derive(Clone, Default)]
pub struct TestModelProvider {
    script: Arc<Mutex<VecDeque<PresetResponse>>>,
    requests: Arc<Mutex<Vec<ModelRequest>>>,
    delay: Option<Duration>,
}

impl TestModelProvider {
    #[inline]
    pub fn add_response(&mut self, preset: PresetResponse) {
        lock(&self.script).push_back(preset);
    }

    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Returns all requests received so far, oldest first.
    #[inline]
    pub fn requests(&self) -> Vec<ModelRequest> {
        lock(&self.requests).clone()
    }

    /// Returns the number of queued responses not yet consumed.
    #[inline]
    pub fn pending_responses(&self) -> usize {
        lock(&self.script).len()
    }
}

impl Debug for TestModelProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestModelProvider")
            .field("pending_responses", &self.pending_responses())
            .field("delay", &self.delay)
            .finish()
    }
}

impl ModelProvider for TestModelProvider {
    type Error = crate::Error;
    type Response = TestModelResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        lock(&self.requests).push(req.clone());
        let result = match lock(&self.script).pop_front() {
            None => Err(Error {
                message: "no enough responses",
                kind: ErrorKind::Other,
            }),
            Some(PresetResponse {
                rejection: Some(kind),
                ..
            }) => Err(Error {
                message: "preset rejection",
                kind,
            }),
            Some(preset) => Ok(TestModelResponse {
                events: preset.events,
                event_idx: 0,
                delay: self.delay.unwrap_or(Duration::from_millis(1)),
                sleep: None,
            }),
        };
        ready(result)
    }
}

#[inline]
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use std::future::poll_fn;
    use std::pin::pin;

    use filechat_model::ModelMessage;

    use super::*;

    async fn collect_response(
        resp: TestModelResponse,
    ) -> Result<String, Error> {
        let mut resp = pin!(resp);
        let mut msg = String::new();
        loop {
            let event = poll_fn(|cx| resp.as_mut().poll_next_event(cx)).await?;
            match event {
                None | Some(ModelResponseEvent::Completed(_)) => break,
                Some(ModelResponseEvent::MessageDelta(delta)) => {
                    msg.push_str(&delta);
                }
            }
        }
        Ok(msg)
    }

    fn request(text: &str) -> ModelRequest {
        ModelRequest {
            model: "test".to_owned(),
            max_tokens: 256,
            temperature: 0.5,
            messages: vec![ModelMessage::User(text.to_owned())],
        }
    }

    #[tokio::test]
    async fn test_send_request() {
        let mut provider = TestModelProvider::default();
        provider.add_response(PresetResponse::with_fragments([
            "Hello, ", "world!",
        ]));
        provider.add_response(PresetResponse::with_fragments([
            "Sure, ",
            "let me take a ",
            "look.",
        ]));

        let resp = provider.send_request(&request("Hi")).await.unwrap();
        assert_eq!(collect_response(resp).await.unwrap(), "Hello, world!");

        let resp = provider.send_request(&request("Check")).await.unwrap();
        assert_eq!(
            collect_response(resp).await.unwrap(),
            "Sure, let me take a look."
        );

        let requests = provider.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1], request("Check"));
        assert_eq!(provider.pending_responses(), 0);
    }

    #[tokio::test]
    async fn test_failures() {
        let mut provider = TestModelProvider::default();
        provider.add_response(PresetResponse::rejected(
            ErrorKind::Authentication,
        ));
        provider.add_response(PresetResponse::with_events([
            PresetEvent::MessageDelta("partial".to_owned()),
            PresetEvent::Failure(ErrorKind::Other),
        ]));

        let err = provider.send_request(&request("Hi")).await.err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Authentication);

        let resp = provider.send_request(&request("Hi")).await.unwrap();
        let err = collect_response(resp).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Other);

        // The script is exhausted now.
        let err = provider.send_request(&request("Hi")).await.err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Other);
    }
}
