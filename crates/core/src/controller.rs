use filechat_model::ModelProvider;

use crate::conversation::{ConversationState, Message};
use crate::error::RequestError;
use crate::event::{ChangeEvent, Notifier};
use crate::model_client::ModelClient;
use crate::prompt::PromptAssembler;
use crate::registry::ModelConfig;

/// Cosmetic marker appended to the in-progress reply.
pub const CURSOR: char = '▌';

/// The stage of one submission.
///
/// A submission moves `Idle -> Streaming` and then ends in either
/// `Committed` or `Failed`. No stage is entered twice.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum StreamStage {
    /// Nothing has been sent yet.
    #[default]
    Idle,
    /// The request is open and fragments are arriving.
    Streaming,
    /// The reply was stored.
    Committed,
    /// The request failed and an error message was stored instead.
    Failed,
}

impl StreamStage {
    /// Returns `true` if a submission may move from this stage to `next`.
    #[inline]
    pub fn can_advance_to(self, next: StreamStage) -> bool {
        matches!(
            (self, next),
            (StreamStage::Idle, StreamStage::Streaming)
                | (StreamStage::Streaming, StreamStage::Committed)
                | (StreamStage::Streaming, StreamStage::Failed)
        )
    }

    /// Returns `true` for the stages a submission ends in.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, StreamStage::Committed | StreamStage::Failed)
    }
}

/// Sends the conversation to the model and stores the streamed reply.
pub struct StreamController {
    client: ModelClient,
    assembler: PromptAssembler,
    notifier: Notifier,
}

impl StreamController {
    /// Creates a controller talking to `provider`.
    pub fn new<P: ModelProvider + 'static>(
        provider: P,
        assembler: PromptAssembler,
        notifier: Notifier,
    ) -> Self {
        Self {
            client: ModelClient::new(provider),
            assembler,
            notifier,
        }
    }

    /// Returns the assembler used to build requests.
    #[inline]
    pub fn assembler(&self) -> &PromptAssembler {
        &self.assembler
    }

    /// Requests a reply to the conversation and stores it.
    ///
    /// While fragments arrive, the accumulated text followed by [`CURSOR`]
    /// is announced as [`ChangeEvent::InProgress`]. When the stream ends,
    /// the reply is appended to `conversation` and returned.
    ///
    /// Failures never escape: a complete error message is appended and
    /// returned in place of the reply, and whatever was streamed before
    /// the failure is dropped.
    pub async fn submit(
        &self,
        conversation: &mut ConversationState,
        config: &ModelConfig,
    ) -> Message {
        let mut run = Run::new(&self.notifier);
        let request = self.assembler.assemble(conversation, config);
        debug!(
            "submitting {} messages to {}",
            request.messages.len(),
            request.model
        );

        run.advance(StreamStage::Streaming);
        let notifier = self.notifier.clone();
        let result = self
            .client
            .send_request(request, move |transcript| {
                notifier.notify(&ChangeEvent::InProgress(format!(
                    "{transcript}{CURSOR}"
                )));
            })
            .await;

        let (message, stage) = match result {
            Ok(resp) => {
                info!(
                    "reply committed ({} fragments, {:?})",
                    resp.fragments, resp.finish_reason
                );
                (Message::assistant(resp.transcript), StreamStage::Committed)
            }
            Err(err) => {
                let err = RequestError::from_provider(&*err);
                warn!("request failed: {err}");
                (Message::error(err.transcript()), StreamStage::Failed)
            }
        };

        conversation.append(message.clone());
        self.notifier
            .notify(&ChangeEvent::MessageCommitted(message.clone()));
        run.advance(stage);
        message
    }
}

/// One pass through the stage machine.
struct Run<'a> {
    stage: StreamStage,
    notifier: &'a Notifier,
}

impl<'a> Run<'a> {
    #[inline]
    fn new(notifier: &'a Notifier) -> Self {
        Self {
            stage: StreamStage::Idle,
            notifier,
        }
    }

    fn advance(&mut self, next: StreamStage) {
        debug_assert!(
            self.stage.can_advance_to(next),
            "invalid transition {:?} -> {next:?}",
            self.stage
        );
        trace!("stage {:?} -> {next:?}", self.stage);
        self.stage = next;
        self.notifier.notify(&ChangeEvent::StageChanged(next));
    }
}
