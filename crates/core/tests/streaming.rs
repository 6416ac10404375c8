use std::sync::{Arc, Mutex};

use filechat_core::{
    CURSOR, ChangeEvent, ConversationState, Message, MessageKind,
    ModelConfig, Notifier, Preamble, PromptAssembler, Role, StreamController,
    StreamStage, compose_user_input,
};
use filechat_model::{ErrorKind, ModelMessage};
use filechat_test_model::{PresetEvent, PresetResponse, TestModelProvider};

fn config() -> ModelConfig {
    ModelConfig::new("claude-3-5-haiku-20241022", 2048, 0.7).unwrap()
}

fn recording_notifier() -> (Notifier, Arc<Mutex<Vec<ChangeEvent>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let mut notifier = Notifier::new();
    notifier.subscribe({
        let events = Arc::clone(&events);
        move |event| events.lock().unwrap().push(event.clone())
    });
    (notifier, events)
}

fn renders(events: &[ChangeEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            ChangeEvent::InProgress(text) => Some(text.clone()),
            _ => None,
        })
        .collect()
}

fn stages(events: &[ChangeEvent]) -> Vec<StreamStage> {
    events
        .iter()
        .filter_map(|e| match e {
            ChangeEvent::StageChanged(stage) => Some(*stage),
            _ => None,
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_streaming_accumulation() {
    let mut provider = TestModelProvider::default();
    provider.add_response(PresetResponse::with_fragments([
        "Hel", "lo", " world",
    ]));
    let (notifier, events) = recording_notifier();
    let controller =
        StreamController::new(provider, PromptAssembler::new(), notifier);

    let mut conversation = ConversationState::new();
    conversation.append(Message::user("Say hello"));
    let reply = controller.submit(&mut conversation, &config()).await;

    assert_eq!(reply, Message::assistant("Hello world"));
    assert_eq!(conversation.last_message(), Some(&reply));
    assert_eq!(conversation.len(), 2);

    let events = events.lock().unwrap();
    let renders = renders(&events);
    assert_eq!(
        renders,
        [
            format!("Hel{CURSOR}"),
            format!("Hello{CURSOR}"),
            format!("Hello world{CURSOR}"),
        ]
    );
    assert!(renders.windows(2).all(|w| w[0].len() < w[1].len()));
    assert_eq!(
        stages(&events),
        [StreamStage::Streaming, StreamStage::Committed]
    );
    // The in-progress text is visible before the commit, and the committed
    // text carries no cursor.
    let committed_at = events
        .iter()
        .position(|e| matches!(e, ChangeEvent::MessageCommitted(_)))
        .unwrap();
    let last_render_at = events
        .iter()
        .rposition(|e| matches!(e, ChangeEvent::InProgress(_)))
        .unwrap();
    assert!(last_render_at < committed_at);
    assert_eq!(
        events[committed_at],
        ChangeEvent::MessageCommitted(Message::assistant("Hello world"))
    );
}

#[tokio::test(start_paused = true)]
async fn test_rejected_credential() {
    let mut provider = TestModelProvider::default();
    provider.add_response(PresetResponse::rejected(ErrorKind::Authentication));
    let (notifier, events) = recording_notifier();
    let controller =
        StreamController::new(provider, PromptAssembler::new(), notifier);

    let mut conversation = ConversationState::new();
    conversation.append(Message::user("Hi"));
    let reply = controller.submit(&mut conversation, &config()).await;

    assert_eq!(reply.role, Role::Assistant);
    assert_eq!(reply.kind, MessageKind::Error);
    assert!(reply.content.contains("Authentication error"));
    assert_eq!(conversation.last_message(), Some(&reply));
    assert_eq!(
        stages(&events.lock().unwrap()),
        [StreamStage::Streaming, StreamStage::Failed]
    );
}

#[tokio::test(start_paused = true)]
async fn test_failure_mid_stream_drops_partial_text() {
    let mut provider = TestModelProvider::default();
    provider.add_response(PresetResponse::with_events([
        PresetEvent::MessageDelta("Half an ans".to_owned()),
        PresetEvent::Failure(ErrorKind::Other),
    ]));
    provider.add_response(PresetResponse::rejected(ErrorKind::ModelNotFound));
    let (notifier, events) = recording_notifier();
    let controller =
        StreamController::new(provider, PromptAssembler::new(), notifier);

    let mut conversation = ConversationState::new();
    conversation.append(Message::user("Hi"));
    let reply = controller.submit(&mut conversation, &config()).await;

    assert_eq!(reply.kind, MessageKind::Error);
    assert!(reply.content.starts_with("❌ **Error**"));
    assert!(!reply.content.contains("Half an ans"));
    assert_eq!(conversation.len(), 2);
    assert_eq!(renders(&events.lock().unwrap()).len(), 1);

    // Every submission runs a fresh stage machine.
    conversation.append(Message::user("Try again"));
    let reply = controller.submit(&mut conversation, &config()).await;
    assert!(reply.content.contains("Model not found"));
    assert_eq!(conversation.len(), 4);
    assert_eq!(
        stages(&events.lock().unwrap()),
        [
            StreamStage::Streaming,
            StreamStage::Failed,
            StreamStage::Streaming,
            StreamStage::Failed,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_payload_excludes_display_only_messages() {
    let mut provider = TestModelProvider::default();
    provider.add_response(PresetResponse::with_fragments(["Sure."]));
    let controller = StreamController::new(
        provider.clone(),
        PromptAssembler::with_preamble(Preamble::new(
            "You review code.",
            "Understood.",
        )),
        Notifier::new(),
    );

    let mut conversation = ConversationState::new();
    conversation.append(Message::notice("🤖 I am your code reviewer."));
    let input = {
        conversation.set_pending_template("Review this code:");
        compose_user_input(&mut conversation, "fn main() {}")
    };
    conversation.append(Message::user(input));
    controller.submit(&mut conversation, &config()).await;

    let requests = provider.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.model, "claude-3-5-haiku-20241022");
    assert_eq!(request.max_tokens, 2048);
    assert_eq!(
        request.messages,
        vec![
            ModelMessage::User("You review code.".to_owned()),
            ModelMessage::Assistant("Understood.".to_owned()),
            ModelMessage::User("Review this code: fn main() {}".to_owned()),
        ]
    );
    // The notice stays on screen and the preamble is never stored.
    assert_eq!(conversation.messages()[0].kind, MessageKind::Notice);
    assert_eq!(conversation.len(), 3);
}
