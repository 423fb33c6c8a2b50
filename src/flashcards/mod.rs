//! Flashcard models for the Anki sync
//!
//! This module provides:
//! - The fixed note field layout shared with the Anki note type
//! - Card payloads built from vault notes
//! - Remote cards and review statistics read back from Anki

pub mod builder;
pub mod models;

pub use builder::build_payloads;
pub use models::*;
