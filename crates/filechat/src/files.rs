//! Collecting uploads from the local file system.

use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};

use filechat_core::Upload;
use tokio::task::spawn_blocking;

/// Files read for a single pattern at most.
pub const MAX_MATCHES: usize = 50;

/// Uploads could not be collected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FilesError {
    /// The glob pattern is malformed.
    Pattern {
        /// The pattern.
        pattern: String,
        /// What is wrong with it.
        reason: String,
    },
    /// Nothing matched the pattern.
    NoMatch(String),
    /// A matched file could not be read.
    Read {
        /// The file.
        path: PathBuf,
        /// The I/O error.
        reason: String,
    },
    /// The blocking task was cancelled.
    Interrupted,
}

impl Display for FilesError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            FilesError::Pattern { pattern, reason } => {
                write!(f, "bad pattern `{pattern}`: {reason}")
            }
            FilesError::NoMatch(pattern) => {
                write!(f, "no files match `{pattern}`")
            }
            FilesError::Read { path, reason } => {
                write!(f, "cannot read {}: {reason}", path.display())
            }
            FilesError::Interrupted => write!(f, "reading files was interrupted"),
        }
    }
}

impl StdError for FilesError {}

/// Reads every regular file matching `patterns`, in pattern order.
///
/// Each upload is named after the file name of its path, which is what
/// the conversation uses to recognize a file uploaded twice.
pub async fn uploads_from_patterns(
    patterns: Vec<String>,
) -> Result<Vec<Upload>, FilesError> {
    spawn_blocking(move || {
        let mut uploads = vec![];
        for pattern in &patterns {
            uploads.extend(read_pattern(pattern)?);
        }
        Ok(uploads)
    })
    .await
    .map_err(|_| FilesError::Interrupted)?
}

fn read_pattern(pattern: &str) -> Result<Vec<Upload>, FilesError> {
    let paths = glob::glob(pattern).map_err(|err| FilesError::Pattern {
        pattern: pattern.to_owned(),
        reason: err.to_string(),
    })?;

    let mut uploads = vec![];
    for path in paths.flatten().filter(|p| p.is_file()).take(MAX_MATCHES) {
        let bytes = fs::read(&path).map_err(|err| FilesError::Read {
            path: path.clone(),
            reason: err.to_string(),
        })?;
        debug!("read {} ({} bytes)", path.display(), bytes.len());
        uploads.push(Upload::new(upload_name(&path), bytes));
    }

    if uploads.is_empty() {
        return Err(FilesError::NoMatch(pattern.to_owned()));
    }
    Ok(uploads)
}

fn upload_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or(path.as_os_str())
        .to_string_lossy()
        .into_owned()
}
