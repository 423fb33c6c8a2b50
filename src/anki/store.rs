use std::collections::HashMap;

use crate::flashcards::{CardPayload, NoteId, RemoteCard, ReviewStat};

use super::error::Result;

/// The operations the sync needs from a flashcard store.
///
/// "Card" here means an Anki note: one per payload. Review statistics are
/// aggregated over the note's generated cards.
pub trait FlashcardStore {
    fn version(&self) -> Result<u32>;

    fn deck_names(&self) -> Result<Vec<String>>;

    fn create_deck(&self, deck: &str) -> Result<u64>;

    fn model_names(&self) -> Result<Vec<String>>;

    fn model_field_names(&self, model: &str) -> Result<Vec<String>>;

    /// Ids of every note matching an Anki search query
    fn find_cards(&self, query: &str) -> Result<Vec<NoteId>>;

    fn get_fields_of(&self, ids: &[NoteId]) -> Result<Vec<RemoteCard>>;

    /// Fails with `AnkiError::DuplicateOrEmptyCard` when Anki rejects the note
    fn add_card(&self, payload: &CardPayload, deck: &str, note_type: &str) -> Result<NoteId>;

    fn delete_cards(&self, ids: &[NoteId]) -> Result<()>;

    /// Notes without any generated card are absent from the result
    fn review_stats(&self, ids: &[NoteId]) -> Result<HashMap<NoteId, ReviewStat>>;
}
