//! Anki access through the AnkiConnect add-on
//!
//! `FlashcardStore` is the narrow seam the sync and report code talk to;
//! `AnkiConnectClient` implements it over the local HTTP API.

mod client;
mod error;
#[cfg(test)]
pub(crate) mod memory;
mod store;

pub use client::*;
pub use error::{AnkiError, Result};
pub use store::FlashcardStore;
