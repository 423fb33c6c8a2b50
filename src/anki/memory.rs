//! In-memory flashcard store for tests

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

use crate::config::AnkiConfig;
use crate::flashcards::{CardPayload, NoteId, RemoteCard, ReviewStat, NOTE_FIELDS};

use super::error::{AnkiError, Result};
use super::store::FlashcardStore;

#[derive(Default)]
struct MemoryState {
    next_id: NoteId,
    decks: Vec<String>,
    models: HashMap<String, Vec<String>>,
    notes: BTreeMap<NoteId, RemoteCard>,
    note_types: HashMap<NoteId, String>,
    stats: HashMap<NoteId, ReviewStat>,
    added: Vec<NoteId>,
    deleted: Vec<NoteId>,
    offline: bool,
    fail_deletes: bool,
    reject_adds: bool,
}

pub struct MemoryStore {
    state: RefCell<MemoryState>,
}

impl MemoryStore {
    /// Store with the given note type defined with the full field list
    pub fn with_note_type(note_type: &str) -> Self {
        let mut state = MemoryState {
            next_id: 1000,
            ..Default::default()
        };
        state.models.insert(
            note_type.to_string(),
            NOTE_FIELDS.iter().map(|f| f.to_string()).collect(),
        );
        Self {
            state: RefCell::new(state),
        }
    }

    pub fn empty() -> Self {
        Self {
            state: RefCell::new(MemoryState {
                next_id: 1000,
                ..Default::default()
            }),
        }
    }

    pub fn define_model(&self, name: &str, fields: &[&str]) {
        self.state
            .borrow_mut()
            .models
            .insert(name.to_string(), fields.iter().map(|f| f.to_string()).collect());
    }

    pub fn set_stat(&self, id: NoteId, stat: ReviewStat) {
        self.state.borrow_mut().stats.insert(id, stat);
    }

    pub fn set_offline(&self, offline: bool) {
        self.state.borrow_mut().offline = offline;
    }

    pub fn set_fail_deletes(&self, fail: bool) {
        self.state.borrow_mut().fail_deletes = fail;
    }

    pub fn set_reject_adds(&self, reject: bool) {
        self.state.borrow_mut().reject_adds = reject;
    }

    pub fn cards(&self) -> Vec<RemoteCard> {
        self.state.borrow().notes.values().cloned().collect()
    }

    pub fn decks(&self) -> Vec<String> {
        self.state.borrow().decks.clone()
    }

    pub fn added(&self) -> Vec<NoteId> {
        self.state.borrow().added.clone()
    }

    pub fn deleted(&self) -> Vec<NoteId> {
        self.state.borrow().deleted.clone()
    }

    pub fn reset_counters(&self) {
        let mut state = self.state.borrow_mut();
        state.added.clear();
        state.deleted.clear();
    }

    fn check_online(&self, action: &str) -> Result<()> {
        if self.state.borrow().offline {
            return Err(AnkiError::Envelope {
                action: action.to_string(),
                message: "failed to connect".to_string(),
            });
        }
        Ok(())
    }
}

impl FlashcardStore for MemoryStore {
    fn version(&self) -> Result<u32> {
        self.check_online("version")?;
        Ok(6)
    }

    fn deck_names(&self) -> Result<Vec<String>> {
        self.check_online("deckNames")?;
        Ok(self.decks())
    }

    fn create_deck(&self, deck: &str) -> Result<u64> {
        self.check_online("createDeck")?;
        let mut state = self.state.borrow_mut();
        state.decks.push(deck.to_string());
        Ok(state.decks.len() as u64)
    }

    fn model_names(&self) -> Result<Vec<String>> {
        self.check_online("modelNames")?;
        Ok(self.state.borrow().models.keys().cloned().collect())
    }

    fn model_field_names(&self, model: &str) -> Result<Vec<String>> {
        self.check_online("modelFieldNames")?;
        self.state
            .borrow()
            .models
            .get(model)
            .cloned()
            .ok_or_else(|| AnkiError::Envelope {
                action: "modelFieldNames".to_string(),
                message: format!("model was not found: {}", model),
            })
    }

    /// Only understands queries built by `AnkiConfig::managed_query`
    fn find_cards(&self, query: &str) -> Result<Vec<NoteId>> {
        self.check_online("findNotes")?;
        let state = self.state.borrow();
        Ok(state
            .notes
            .values()
            .filter(|card| {
                let scope = AnkiConfig {
                    deck: card.deck_path.clone().unwrap_or_default(),
                    note_type: state.note_types.get(&card.id).cloned().unwrap_or_default(),
                    ..AnkiConfig::default()
                };
                scope.managed_query() == query
            })
            .map(|card| card.id)
            .collect())
    }

    fn get_fields_of(&self, ids: &[NoteId]) -> Result<Vec<RemoteCard>> {
        self.check_online("notesInfo")?;
        let state = self.state.borrow();
        Ok(ids.iter().filter_map(|id| state.notes.get(id).cloned()).collect())
    }

    fn add_card(&self, payload: &CardPayload, deck: &str, note_type: &str) -> Result<NoteId> {
        self.check_online("addNote")?;
        let mut state = self.state.borrow_mut();
        if state.reject_adds {
            return Err(AnkiError::DuplicateOrEmptyCard(
                "cannot create note because it is empty".to_string(),
            ));
        }
        state.next_id += 1;
        let id = state.next_id;
        state.notes.insert(
            id,
            RemoteCard {
                id,
                fields: payload.to_fields(),
                deck_path: Some(deck.to_string()),
            },
        );
        state.note_types.insert(id, note_type.to_string());
        state.added.push(id);
        Ok(id)
    }

    fn delete_cards(&self, ids: &[NoteId]) -> Result<()> {
        self.check_online("deleteNotes")?;
        let mut state = self.state.borrow_mut();
        if state.fail_deletes {
            return Err(AnkiError::Envelope {
                action: "deleteNotes".to_string(),
                message: "failed to delete".to_string(),
            });
        }
        for id in ids {
            state.notes.remove(id);
            state.note_types.remove(id);
            state.stats.remove(id);
            state.deleted.push(*id);
        }
        Ok(())
    }

    fn review_stats(&self, ids: &[NoteId]) -> Result<HashMap<NoteId, ReviewStat>> {
        self.check_online("cardsInfo")?;
        let state = self.state.borrow();
        Ok(ids
            .iter()
            .filter(|id| state.notes.contains_key(*id))
            .map(|id| (*id, state.stats.get(id).cloned().unwrap_or_default()))
            .collect())
    }
}
