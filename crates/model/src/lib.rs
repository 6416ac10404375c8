//! A provider-neutral protocol for streaming chat completions.
//!
//! This crate establishes the contract between the conversation core and
//! the hosted model that answers it, so that the core can be driven by a
//! real HTTP provider in production and by a scripted fake in tests
//! without modifying any of its logic.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to.

#![deny(missing_docs)]

mod error;
mod provider;
mod request;
mod response;

pub use error::*;
pub use provider::*;
pub use request::*;
pub use response::*;
