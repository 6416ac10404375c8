//! Turning uploaded files into conversation messages.
//!
//! Ingestion never talks to the model. An ingested file becomes a user
//! message that rides along with the next request.

use std::borrow::Cow;
use std::path::Path;

use crate::conversation::{ConversationState, Message};
use crate::error::IngestError;

/// Default number of characters kept from an uploaded file.
pub const DEFAULT_MAX_FILE_CHARS: usize = 4000;
/// Appended to the content of a truncated file.
pub const TRUNCATION_MARKER: &str = "\n\n... [file truncated]";
/// Code fence language used when the extension has no better hint.
pub const DEFAULT_LANGUAGE: &str = "text";
/// Extensions accepted by default.
pub const ALLOWED_EXTENSIONS: &[&str] = &[
    "php", "py", "txt", "html", "js", "css", "md", "json", "csv", "xml", "sql",
];

/// An uploaded artifact.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Upload {
    /// The file name, which is also the deduplication key.
    pub name: String,
    /// The raw content.
    pub bytes: Vec<u8>,
}

impl Upload {
    /// Creates an upload.
    #[inline]
    pub fn new<S: Into<String>, B: Into<Vec<u8>>>(name: S, bytes: B) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Options of a [`FileIngestor`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IngestOptions {
    /// Characters of content kept before truncating.
    pub max_chars: usize,
    /// Lowercase extensions, without the dot, that may be uploaded.
    pub allowed_extensions: Vec<String>,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_MAX_FILE_CHARS,
            allowed_extensions: ALLOWED_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        }
    }
}

/// The result of ingesting one upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The file was appended as this message.
    Ingested(Message),
    /// A file with the same name was ingested before.
    Skipped,
    /// The file was rejected and not marked as ingested.
    Failed(IngestError),
}

/// Converts uploads into truncated, fenced user messages.
#[derive(Clone, Debug, Default)]
pub struct FileIngestor {
    options: IngestOptions,
}

impl FileIngestor {
    /// Creates an ingestor with the given options.
    #[inline]
    pub fn new(options: IngestOptions) -> Self {
        Self { options }
    }

    /// Returns the options of this ingestor.
    #[inline]
    pub fn options(&self) -> &IngestOptions {
        &self.options
    }

    /// Ingests every upload in order and reports one outcome per upload.
    ///
    /// A failing file doesn't stop the remaining ones from being processed.
    pub fn ingest<I>(
        &self,
        state: &mut ConversationState,
        uploads: I,
    ) -> Vec<IngestOutcome>
    where
        I: IntoIterator<Item = Upload>,
    {
        uploads
            .into_iter()
            .map(|upload| self.ingest_one(state, upload))
            .collect()
    }

    /// Ingests a single upload.
    pub fn ingest_one(
        &self,
        state: &mut ConversationState,
        upload: Upload,
    ) -> IngestOutcome {
        let Upload { name, bytes } = upload;

        if !self.is_allowed(&name) {
            warn!("rejected upload `{name}`: extension not allowed");
            return IngestOutcome::Failed(IngestError::UnsupportedExtension {
                name,
            });
        }

        let content = match String::from_utf8(bytes) {
            Ok(content) => content,
            Err(err) => {
                warn!("rejected upload `{name}`: {err}");
                return IngestOutcome::Failed(IngestError::Decode {
                    name,
                    valid_up_to: err.utf8_error().valid_up_to(),
                });
            }
        };

        if !state.mark_ingested(&name) {
            debug!("skipping `{name}`, already ingested");
            return IngestOutcome::Skipped;
        }

        let content = truncate(&content, self.options.max_chars);
        let message = Message::user(format_file_message(
            &name,
            language_hint(&name),
            &content,
        ));
        info!("ingested `{name}` ({} chars)", content.chars().count());
        state.append(message.clone());
        IngestOutcome::Ingested(message)
    }

    fn is_allowed(&self, name: &str) -> bool {
        extension(name).is_some_and(|ext| {
            self.options.allowed_extensions.iter().any(|a| *a == ext)
        })
    }
}

/// Keeps the first `max_chars` characters of `content`, followed by
/// [`TRUNCATION_MARKER`] if anything was cut.
pub fn truncate(content: &str, max_chars: usize) -> Cow<'_, str> {
    match content.char_indices().nth(max_chars) {
        Some((cut, _)) => {
            Cow::Owned(format!("{}{TRUNCATION_MARKER}", &content[..cut]))
        }
        None => Cow::Borrowed(content),
    }
}

/// Returns the code fence language for a file name.
pub fn language_hint(name: &str) -> &'static str {
    match extension(name).as_deref() {
        Some("php") => "php",
        Some("py") => "python",
        Some("js") => "javascript",
        Some("html") => "html",
        Some("css") => "css",
        Some("md") => "markdown",
        Some("json") => "json",
        Some("csv") => "csv",
        Some("xml") => "xml",
        Some("sql") => "sql",
        _ => DEFAULT_LANGUAGE,
    }
}

fn extension(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
}

fn format_file_message(name: &str, language: &str, content: &str) -> String {
    format!(
        "📄 **Uploaded file: `{name}`**\n\n```{language}\n{content}\n```\n\n\
         Please analyze this file and answer my questions about it."
    )
}
