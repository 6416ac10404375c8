//! The conversational core: message history, file ingestion, prompt
//! assembly, and the streaming reply controller.
//!
//! Everything here runs on the caller's task. A handler receives the
//! session's [`ConversationState`] by reference, mutates it, and announces
//! the change through a [`Notifier`]; how the change is drawn is up to the
//! subscribers.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

mod controller;
pub mod conversation;
mod error;
mod event;
pub mod ingest;
mod model_client;
mod prompt;
mod registry;

pub use controller::{CURSOR, StreamController, StreamStage};
pub use conversation::{ConversationState, Message, MessageKind, Role};
pub use error::{ConfigError, IngestError, RequestError};
pub use event::{ChangeEvent, Notifier};
pub use ingest::{FileIngestor, IngestOptions, IngestOutcome, Upload};
pub use prompt::{Preamble, PromptAssembler, compose_user_input};
pub use registry::{
    BUILTIN_MODELS, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, MAX_TOKENS_RANGE,
    ModelConfig, ModelRegistry, TEMPERATURE_RANGE,
};
