use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use crate::conversation::Message;
use crate::controller::StreamStage;
use crate::error::IngestError;
use crate::registry::ModelConfig;

/// A change the rendering layer may want to redraw for.
#[derive(Clone, Debug, PartialEq)]
pub enum ChangeEvent {
    /// A finished message was added, e.g. a user turn or an uploaded file.
    MessageAppended(Message),
    /// The streaming controller entered another stage.
    StageChanged(StreamStage),
    /// The in-progress assistant reply, followed by the cursor marker.
    InProgress(String),
    /// The assistant reply (or the error standing in for it) was stored.
    MessageCommitted(Message),
    /// An uploaded file was rejected.
    IngestFailed(IngestError),
    /// A quick-prompt template is waiting for the next submission.
    TemplateSelected(String),
    /// Another model configuration was selected.
    ModelChanged(ModelConfig),
    /// The conversation was cleared.
    Reset,
}

type Observer = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;

/// Fans [`ChangeEvent`]s out to the subscribed observers.
///
/// Clones share nothing but the observers registered before cloning.
#[derive(Clone, Default)]
pub struct Notifier {
    observers: Vec<Observer>,
}

impl Notifier {
    /// Creates a notifier without observers.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an observer. Observers are called in subscription order.
    #[inline]
    pub fn subscribe(
        &mut self,
        observer: impl Fn(&ChangeEvent) + Send + Sync + 'static,
    ) {
        self.observers.push(Arc::new(observer));
    }

    /// Delivers `event` to every observer.
    #[inline]
    pub fn notify(&self, event: &ChangeEvent) {
        for observer in &self.observers {
            observer(event);
        }
    }
}

impl Debug for Notifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("observers", &self.observers.len())
            .finish()
    }
}
