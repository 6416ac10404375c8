//! A terminal front-end for chatting with a model about local files.

#[macro_use]
extern crate tracing;

mod command;

use std::io::Write as _;
use std::pin::pin;
use std::time::Duration;

use filechat::core::{
    CURSOR, ChangeEvent, IngestOutcome, Message, MessageKind, ModelConfig,
    ModelRegistry, Preamble,
};
use filechat::{Session, SessionBuilder, Settings, files, templates};
use filechat_anthropic_model::AnthropicProvider;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use serde::Serialize;
use tokio::io::{self, AsyncBufReadExt};
use tokio::select;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::time::sleep;

use crate::command::{Command, HELP};

const BAR_CHAR: &str = "▎";
const PREAMBLE_ACK: &str =
    "Understood. Share your files and I will answer questions about them.";
const GREETING: &str =
    "🤖 Hi! Add files with /upload <glob> and ask me anything about them.";

#[derive(Serialize)]
struct DebugInfo<'a> {
    messages: usize,
    ingested_files: &'a [String],
    pending_template: Option<&'a str>,
    model: &'a ModelConfig,
    last_message: Option<&'a Message>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let registry = ModelRegistry::builtin();
    let settings = match Settings::from_env(&registry) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("{} {err}", "error:".bright_red().bold());
            return;
        }
    };

    let config = settings.anthropic_config();
    println!("🔑 API key: {} ✅", config.masked_api_key());
    println!(
        "🤖 Model: {}",
        settings.model_config().model_id().bright_white().bold()
    );
    let model_provider = AnthropicProvider::new(config);

    let (render_tx, mut render_rx) = mpsc::unbounded_channel();

    let session = SessionBuilder::with_model_provider(model_provider)
        .with_preamble(Preamble::new(
            include_str!("./preamble.md").trim(),
            PREAMBLE_ACK,
        ))
        .with_ingest_options(settings.ingest_options())
        .with_model_config(settings.model_config().clone())
        .with_registry(registry)
        .on_change(move |event| {
            if let ChangeEvent::InProgress(render) = event {
                render_tx.send(render.clone()).ok();
            }
        })
        .build();
    let mut session = match session {
        Ok(session) => session,
        Err(err) => {
            eprintln!("{} {err}", "error:".bright_red().bold());
            return;
        }
    };
    greet(&mut session);

    let progress_style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");

    loop {
        print!("> ");
        std::io::stdout().flush().ok();

        let Some(line) = read_line().await else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let command = match Command::parse(line) {
            Ok(command) => command,
            Err(err) => {
                print_error(&err.to_string());
                continue;
            }
        };
        match command {
            Command::Chat(text) => {
                chat(&mut session, &mut render_rx, &text, &progress_style)
                    .await;
            }
            Command::Upload(patterns) => upload(&mut session, patterns).await,
            Command::Template(name) => match session.select_template(&name) {
                Ok(template) => println!(
                    "{} will prefix your next message",
                    template.title.bright_white()
                ),
                Err(err) => print_error(&err.to_string()),
            },
            Command::Templates => {
                for template in templates::TEMPLATES {
                    println!(
                        "{:<10} {}",
                        template.name.bright_white(),
                        template.title
                    );
                }
            }
            Command::Model(model_id) => {
                report(session.select_model(&model_id), &session);
            }
            Command::Models => {
                for model in session.registry().models() {
                    if model == session.model_config().model_id() {
                        println!("● {}", model.bright_white().bold());
                    } else {
                        println!("  {model}");
                    }
                }
            }
            Command::MaxTokens(max_tokens) => {
                report(session.set_max_tokens(max_tokens), &session);
            }
            Command::Temperature(temperature) => {
                report(session.set_temperature(temperature), &session);
            }
            Command::Reset => {
                session.reset();
                println!("🗑️  Conversation cleared");
                greet(&mut session);
            }
            Command::Debug => print_debug(&session),
            Command::Help => println!("{HELP}"),
            Command::Quit => break,
        }
    }
}

fn greet(session: &mut Session) {
    session.post_notice(GREETING);
    println!("{}{}", BAR_CHAR.bright_cyan(), GREETING.bright_white());
}

async fn chat(
    session: &mut Session,
    render_rx: &mut UnboundedReceiver<String>,
    text: &str,
    progress_style: &ProgressStyle,
) {
    let mut reply = pin!(session.send_message(text));

    let progress_bar = ProgressBar::new_spinner();
    progress_bar.set_style(progress_style.clone());
    progress_bar.set_message("🤔 Thinking...");

    let mut printed = 0;
    let message = loop {
        select! {
            biased;
            Some(render) = render_rx.recv() => {
                if printed == 0 {
                    progress_bar.finish_and_clear();
                    print!("{}🤖 ", BAR_CHAR.bright_cyan());
                }
                printed = print_render(&render, printed);
            }
            message = &mut reply => break message,
            _ = sleep(Duration::from_millis(100)) => {
                progress_bar.inc(1);
            }
        }
    };
    // Renders sent while the reply was being polled for the last time.
    while let Ok(render) = render_rx.try_recv() {
        printed = print_render(&render, printed);
    }
    progress_bar.finish_and_clear();

    match message.kind {
        MessageKind::Error => {
            if printed > 0 {
                println!();
            }
            println!("{}{}", BAR_CHAR.bright_red(), message.content.bright_red());
        }
        _ if printed == 0 => {
            println!("{}🤖 {}", BAR_CHAR.bright_cyan(), message.content);
        }
        _ => println!(),
    }
}

/// Prints the part of `render` past the first `printed` bytes and returns
/// the new count.
fn print_render(render: &str, printed: usize) -> usize {
    let transcript = render.strip_suffix(CURSOR).unwrap_or(render);
    if let Some(delta) = transcript.get(printed..) {
        print!("{}", delta.bright_white());
        std::io::stdout().flush().ok();
    }
    transcript.len().max(printed)
}

async fn upload(session: &mut Session, patterns: Vec<String>) {
    let uploads = match files::uploads_from_patterns(patterns).await {
        Ok(uploads) => uploads,
        Err(err) => {
            print_error(&err.to_string());
            return;
        }
    };

    let names: Vec<_> = uploads.iter().map(|u| u.name.clone()).collect();
    for (name, outcome) in names.iter().zip(session.upload(uploads)) {
        match outcome {
            IngestOutcome::Ingested(_) => {
                println!("📄 {} uploaded", name.bright_white());
            }
            IngestOutcome::Skipped => {
                println!("📄 {} was already uploaded", name.dimmed());
            }
            IngestOutcome::Failed(err) => print_error(&err.to_string()),
        }
    }
}

fn report<E: std::fmt::Display>(result: Result<(), E>, session: &Session) {
    match result {
        Ok(()) => {
            let config = session.model_config();
            println!(
                "🤖 {} (max tokens {}, temperature {})",
                config.model_id().bright_white().bold(),
                config.max_tokens(),
                config.temperature()
            );
        }
        Err(err) => print_error(&err.to_string()),
    }
}

fn print_debug(session: &Session) {
    let conversation = session.conversation();
    let info = DebugInfo {
        messages: conversation.len(),
        ingested_files: conversation.ingested_files(),
        pending_template: conversation.pending_template(),
        model: session.model_config(),
        last_message: conversation.last_message(),
    };
    match serde_json::to_string_pretty(&info) {
        Ok(json) => println!("{json}"),
        Err(err) => error!("cannot serialize session state: {err}"),
    }
}

fn print_error(message: &str) {
    println!("{}❌ {}", BAR_CHAR.bright_red(), message.bright_red());
}

async fn read_line() -> Option<String> {
    let mut stdin = io::BufReader::new(io::stdin());
    let mut line = String::new();

    match stdin.read_line(&mut line).await {
        Ok(count) => {
            if count == 0 {
                return None;
            }
            Some(line)
        }
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}
