//! Decides, per card payload, whether Anki needs a create, a replace or
//! nothing at all

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::anki::{AnkiError, FlashcardStore};
use crate::config::AnkiConfig;
use crate::flashcards::{CardPayload, NoteId, ProvenanceKey, RemoteCard};

/// What to do with one payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Create,
    /// Delete these stale cards, then create
    Replace(Vec<NoteId>),
    Skip,
}

/// Policy for a single payload given the cards already stored under its key.
///
/// Replace when any stored card carries an older (or unreadable) source
/// time; an equal time counts as up to date.
pub fn decide(existing: &[RemoteCard], payload: &CardPayload) -> Decision {
    if existing.is_empty() {
        return Decision::Create;
    }

    let stale = existing.iter().any(|card| match card.source_mod_time() {
        Some(stored) => stored < payload.source_mod_time,
        None => true,
    });

    if stale {
        Decision::Replace(existing.iter().map(|c| c.id).collect())
    } else {
        Decision::Skip
    }
}

/// Counts for one document's payloads
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentOutcome {
    pub created: usize,
    pub deleted: usize,
    pub unchanged: usize,
    pub failed: usize,
}

impl DocumentOutcome {
    pub fn writes(&self) -> usize {
        self.created + self.deleted
    }
}

pub struct Reconciler<'a, S: FlashcardStore + ?Sized> {
    store: &'a S,
    deck: &'a str,
    note_type: &'a str,
    existing: HashMap<ProvenanceKey, Vec<RemoteCard>>,
    seen: HashSet<ProvenanceKey>,
}

impl<'a, S: FlashcardStore + ?Sized> Reconciler<'a, S> {
    pub fn new(store: &'a S, config: &'a AnkiConfig, existing: Vec<RemoteCard>) -> Self {
        let mut index: HashMap<ProvenanceKey, Vec<RemoteCard>> = HashMap::new();
        for card in existing {
            index.entry(card.key()).or_default().push(card);
        }

        Self {
            store,
            deck: &config.deck,
            note_type: &config.note_type,
            existing: index,
            seen: HashSet::new(),
        }
    }

    /// Apply every payload of one source document.
    ///
    /// A failed add is logged and counted. A failed delete abandons the rest
    /// of the document and is returned.
    pub fn sync_document(&mut self, payloads: &[CardPayload]) -> Result<DocumentOutcome, AnkiError> {
        let mut outcome = DocumentOutcome::default();

        for payload in payloads {
            let key = payload.key();
            self.seen.insert(key.clone());

            let decision = decide(
                self.existing.get(&key).map(Vec::as_slice).unwrap_or(&[]),
                payload,
            );

            match decision {
                Decision::Skip => {
                    log::debug!(
                        "Skipping '{}' / '{}' (Anki card is up to date)",
                        payload.expression,
                        payload.prompt
                    );
                    outcome.unchanged += 1;
                    continue;
                }
                Decision::Replace(ids) => {
                    log::info!(
                        "{} is newer than Anki; replacing {} card(s) for '{}'",
                        payload.source_filename,
                        ids.len(),
                        payload.expression
                    );
                    self.store.delete_cards(&ids)?;
                    self.existing.remove(&key);
                    outcome.deleted += ids.len();
                }
                Decision::Create => {}
            }

            match self.store.add_card(payload, self.deck, self.note_type) {
                Ok(id) => {
                    log::debug!("Added note {} for '{}'", id, payload.expression);
                    outcome.created += 1;
                }
                Err(e) => {
                    log::warn!(
                        "Note failed for '{}' (prompt: '{}'): {}",
                        payload.expression,
                        truncate(&payload.prompt, 50),
                        e
                    );
                    if let Some(hint) = e.hint() {
                        log::warn!("  -> {}", hint);
                    }
                    outcome.failed += 1;
                }
            }
        }

        Ok(outcome)
    }

    /// Keep every stored card of `source_filename` out of the orphan set.
    ///
    /// Used when a document could not be read or synced, so its cards are
    /// left as they are for this run.
    pub fn hold_file(&mut self, source_filename: &str) {
        let held: Vec<ProvenanceKey> = self
            .existing
            .keys()
            .filter(|key| key.source_filename == source_filename)
            .cloned()
            .collect();
        if !held.is_empty() {
            log::debug!("Holding {} card key(s) of {}", held.len(), source_filename);
        }
        self.seen.extend(held);
    }

    /// Stored cards whose key matched no payload in this run
    pub fn orphans(&self) -> Vec<&RemoteCard> {
        let mut orphans: Vec<&RemoteCard> = self
            .existing
            .iter()
            .filter(|(key, _)| !self.seen.contains(*key))
            .flat_map(|(_, cards)| cards.iter())
            .collect();
        orphans.sort_by(|a, b| a.key().cmp(&b.key()).then(a.id.cmp(&b.id)));
        orphans
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        format!("{}...", text.chars().take(max_chars).collect::<String>())
    }
}
