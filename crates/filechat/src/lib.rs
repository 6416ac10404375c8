//! A chat session for asking a model about uploaded source files.
//!
//! The crate includes a CLI tool for using in the terminal. And you can also
//! use it as a library to drive a session from your own front-end.

#![deny(missing_docs)]

#[allow(unused_imports)]
#[macro_use]
extern crate tracing;

pub mod files;
mod session;
mod settings;
pub mod templates;

pub use session::{Session, SessionBuilder};
pub use settings::Settings;

/// Re-exports of [`filechat_core`] crate.
pub mod core {
    pub use filechat_core::*;
}
