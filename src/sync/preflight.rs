//! Checks run before any card is written

use serde::Serialize;
use thiserror::Error;

use crate::anki::{AnkiError, FlashcardStore};
use crate::config::AnkiConfig;
use crate::flashcards::NOTE_FIELDS;

#[derive(Error, Debug)]
pub enum PreflightError {
    #[error("AnkiConnect is not responding: {0}")]
    Unreachable(#[source] AnkiError),

    #[error("Note type '{0}' does not exist in Anki")]
    NoteTypeMissing(String),

    #[error("Note type '{note_type}' is missing required fields: {}", .missing.join(", "))]
    MissingFields {
        note_type: String,
        missing: Vec<String>,
    },

    #[error("Anki error: {0}")]
    Anki(#[from] AnkiError),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreflightReport {
    pub anki_connect_version: u32,
    pub deck_created: bool,
}

/// Verify AnkiConnect answers, the deck exists (creating it if needed) and
/// the note type carries every required field
pub fn run_preflight<S: FlashcardStore + ?Sized>(
    store: &S,
    config: &AnkiConfig,
) -> Result<PreflightReport, PreflightError> {
    let version = store.version().map_err(PreflightError::Unreachable)?;
    log::info!("AnkiConnect is online. Version: {}", version);

    let deck_created = ensure_deck(store, &config.deck)?;
    validate_note_type(store, &config.note_type)?;

    Ok(PreflightReport {
        anki_connect_version: version,
        deck_created,
    })
}

fn ensure_deck<S: FlashcardStore + ?Sized>(store: &S, deck: &str) -> Result<bool, PreflightError> {
    let decks = store.deck_names()?;
    if decks.iter().any(|d| d == deck) {
        log::info!("Deck '{}' already exists", deck);
        return Ok(false);
    }

    log::info!("Deck '{}' not found; creating it", deck);
    store.create_deck(deck)?;
    Ok(true)
}

fn validate_note_type<S: FlashcardStore + ?Sized>(
    store: &S,
    note_type: &str,
) -> Result<(), PreflightError> {
    let models = store.model_names()?;
    if !models.iter().any(|m| m == note_type) {
        return Err(PreflightError::NoteTypeMissing(note_type.to_string()));
    }

    let fields = store.model_field_names(note_type)?;
    let missing: Vec<String> = NOTE_FIELDS
        .iter()
        .filter(|required| !fields.iter().any(|f| f == *required))
        .map(|f| f.to_string())
        .collect();

    if !missing.is_empty() {
        return Err(PreflightError::MissingFields {
            note_type: note_type.to_string(),
            missing,
        });
    }

    log::info!("Note type '{}' found with all required fields", note_type);
    Ok(())
}
