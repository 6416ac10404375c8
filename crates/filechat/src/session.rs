use filechat_core::{
    ChangeEvent, ConfigError, ConversationState, FileIngestor, IngestOptions,
    IngestOutcome, Message, ModelConfig, ModelRegistry, Notifier, Preamble,
    PromptAssembler, StreamController, Upload, compose_user_input,
};
use filechat_model::ModelProvider;

use crate::templates::{self, Template, UnknownTemplate};

type MakeController =
    Box<dyn FnOnce(PromptAssembler, Notifier) -> StreamController>;

/// A session builder.
///
/// See [`Session`].
pub struct SessionBuilder {
    make_controller: MakeController,
    preamble: Option<Preamble>,
    ingest_options: IngestOptions,
    registry: ModelRegistry,
    model_config: Option<ModelConfig>,
    notifier: Notifier,
}

impl SessionBuilder {
    /// Creates a session builder with a specified model provider.
    pub fn with_model_provider<M: ModelProvider + 'static>(
        provider: M,
    ) -> Self {
        Self {
            make_controller: Box::new(move |assembler, notifier| {
                StreamController::new(provider, assembler, notifier)
            }),
            preamble: None,
            ingest_options: IngestOptions::default(),
            registry: ModelRegistry::builtin(),
            model_config: None,
            notifier: Notifier::new(),
        }
    }

    /// Sets the instruction pair sent ahead of the history.
    #[inline]
    pub fn with_preamble(mut self, preamble: Preamble) -> Self {
        self.preamble = Some(preamble);
        self
    }

    /// Sets how uploads are ingested.
    #[inline]
    pub fn with_ingest_options(mut self, options: IngestOptions) -> Self {
        self.ingest_options = options;
        self
    }

    /// Sets the models a user may choose from.
    #[inline]
    pub fn with_registry(mut self, registry: ModelRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Sets the initial model configuration. Defaults to the registry's
    /// default model.
    #[inline]
    pub fn with_model_config(mut self, config: ModelConfig) -> Self {
        self.model_config = Some(config);
        self
    }

    /// Attaches a callback to be invoked on every change of the session.
    #[inline]
    pub fn on_change(
        mut self,
        on_change: impl Fn(&ChangeEvent) + Send + Sync + 'static,
    ) -> Self {
        self.notifier.subscribe(on_change);
        self
    }

    /// Builds a new session.
    ///
    /// Fails if the model configuration names a model outside of the
    /// registry.
    pub fn build(self) -> Result<Session, ConfigError> {
        let model_config = match self.model_config {
            Some(config) => {
                self.registry.validate(&config)?;
                config
            }
            None => self.registry.default_config(),
        };
        let assembler = match self.preamble {
            Some(preamble) => PromptAssembler::with_preamble(preamble),
            None => PromptAssembler::new(),
        };
        let controller =
            (self.make_controller)(assembler, self.notifier.clone());

        Ok(Session {
            controller,
            ingestor: FileIngestor::new(self.ingest_options),
            registry: self.registry,
            model_config,
            conversation: ConversationState::new(),
            notifier: self.notifier,
        })
    }
}

/// A chat session, like a window that displays messages and has an input
/// box and a file picker.
///
/// Every mutation is announced to the `on_change` callback of the builder.
pub struct Session {
    controller: StreamController,
    ingestor: FileIngestor,
    registry: ModelRegistry,
    model_config: ModelConfig,
    conversation: ConversationState,
    notifier: Notifier,
}

impl Session {
    /// Adds uploaded files to the conversation.
    ///
    /// Returns one outcome per upload. Rejected files are announced and
    /// leave the conversation untouched.
    pub fn upload<I>(&mut self, uploads: I) -> Vec<IngestOutcome>
    where
        I: IntoIterator<Item = Upload>,
    {
        let outcomes = self.ingestor.ingest(&mut self.conversation, uploads);
        for outcome in &outcomes {
            match outcome {
                IngestOutcome::Ingested(message) => self
                    .notifier
                    .notify(&ChangeEvent::MessageAppended(message.clone())),
                IngestOutcome::Failed(err) => self
                    .notifier
                    .notify(&ChangeEvent::IngestFailed(err.clone())),
                IngestOutcome::Skipped => {}
            }
        }
        outcomes
    }

    /// Holds a quick-prompt template for the next submission.
    pub fn select_template(
        &mut self,
        name: &str,
    ) -> Result<&'static Template, UnknownTemplate> {
        let template = templates::find(name)?;
        self.set_template(template.prompt);
        Ok(template)
    }

    /// Holds a custom prefix for the next submission, replacing any
    /// template selected before.
    pub fn set_template<S: Into<String>>(&mut self, prompt: S) {
        let prompt = prompt.into();
        self.conversation.set_pending_template(prompt.clone());
        self.notifier.notify(&ChangeEvent::TemplateSelected(prompt));
    }

    /// Submits user input and waits for the reply.
    ///
    /// The returned message is the assistant reply, or the error message
    /// stored in its place.
    pub async fn send_message(&mut self, text: &str) -> Message {
        let content = compose_user_input(&mut self.conversation, text);
        self.append(Message::user(content));
        self.controller
            .submit(&mut self.conversation, &self.model_config)
            .await
    }

    /// Shows a message that is never sent to the model.
    #[inline]
    pub fn post_notice<S: Into<String>>(&mut self, text: S) {
        self.append(Message::notice(text));
    }

    /// Clears the conversation, the ingested files and the pending
    /// template. The model configuration is kept.
    pub fn reset(&mut self) {
        self.conversation.reset();
        info!("conversation reset");
        self.notifier.notify(&ChangeEvent::Reset);
    }

    /// Replaces the model configuration.
    pub fn set_model_config(
        &mut self,
        config: ModelConfig,
    ) -> Result<(), ConfigError> {
        self.registry.validate(&config)?;
        debug!("model configuration changed: {config:?}");
        self.model_config = config.clone();
        self.notifier.notify(&ChangeEvent::ModelChanged(config));
        Ok(())
    }

    /// Switches to another model of the registry.
    #[inline]
    pub fn select_model(&mut self, model_id: &str) -> Result<(), ConfigError> {
        self.set_model_config(self.model_config.with_model_id(model_id)?)
    }

    /// Changes the token limit of later requests.
    #[inline]
    pub fn set_max_tokens(&mut self, max_tokens: u32) -> Result<(), ConfigError> {
        self.set_model_config(self.model_config.with_max_tokens(max_tokens)?)
    }

    /// Changes the temperature of later requests.
    #[inline]
    pub fn set_temperature(
        &mut self,
        temperature: f32,
    ) -> Result<(), ConfigError> {
        self.set_model_config(self.model_config.with_temperature(temperature)?)
    }

    /// Returns the current model configuration.
    #[inline]
    pub fn model_config(&self) -> &ModelConfig {
        &self.model_config
    }

    /// Returns the models a user may choose from.
    #[inline]
    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Returns the conversation.
    #[inline]
    pub fn conversation(&self) -> &ConversationState {
        &self.conversation
    }

    fn append(&mut self, message: Message) {
        self.conversation.append(message.clone());
        self.notifier.notify(&ChangeEvent::MessageAppended(message));
    }
}
