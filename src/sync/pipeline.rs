//! One pass over the vault: scan, extract, build, reconcile

use std::time::Instant;

use serde::Serialize;
use thiserror::Error;

use crate::anki::{AnkiError, FlashcardStore};
use crate::config::SyncConfig;
use crate::flashcards::{build_payloads, NoteId, ProvenanceKey};
use crate::obsidian::{extract_record, scan_notes, ScanError};

use super::preflight::PreflightError;
use super::reconcile::{DocumentOutcome, Reconciler};

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Preflight failed: {0}")]
    Preflight(#[from] PreflightError),
    #[error("Could not read existing cards from Anki: {0}")]
    Anki(#[from] AnkiError),
    #[error("Vault scan failed: {0}")]
    Scan(#[from] ScanError),
}

/// Totals for a sync run
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSummary {
    pub notes_scanned: usize,
    pub notes_synced: usize,
    /// Notes without a header or the eligibility tag
    pub notes_ignored: usize,
    pub notes_without_prompts: usize,
    pub notes_failed: usize,
    pub cards_created: usize,
    pub cards_deleted: usize,
    pub cards_unchanged: usize,
    pub cards_failed: usize,
    pub orphans: Vec<ProvenanceKey>,
    pub orphans_deleted: usize,
    pub duration_ms: u64,
}

impl SyncSummary {
    fn absorb(&mut self, outcome: &DocumentOutcome) {
        self.cards_created += outcome.created;
        self.cards_deleted += outcome.deleted;
        self.cards_unchanged += outcome.unchanged;
        self.cards_failed += outcome.failed;
    }

    pub fn writes(&self) -> usize {
        self.cards_created + self.cards_deleted + self.orphans_deleted
    }
}

/// Sync every eligible note in the vault into Anki.
///
/// Expects preflight to have passed. Reading the existing cards is the only
/// store failure that aborts the run; everything after that is handled per
/// document.
pub fn sync_vault<S: FlashcardStore + ?Sized>(
    store: &S,
    config: &SyncConfig,
) -> Result<SyncSummary, SyncError> {
    let start = Instant::now();
    let mut summary = SyncSummary::default();

    let query = config.anki.managed_query();
    let existing_ids = store.find_cards(&query)?;
    let existing = store.get_fields_of(&existing_ids)?;
    log::info!("Found {} existing card(s) for {}", existing.len(), query);

    let notes = scan_notes(&config.vault.path, &config.vault.notes_path())?;
    summary.notes_scanned = notes.len();

    let mut reconciler = Reconciler::new(store, &config.anki, existing);

    for (i, note) in notes.iter().enumerate() {
        log::debug!("Processing file {}/{}: {}", i + 1, notes.len(), note.relative_path);

        let record = match extract_record(
            &note.content,
            &note.relative_path,
            note.modified,
            &config.vault.eligibility_tag,
        ) {
            Ok(Some(record)) => record,
            Ok(None) => {
                summary.notes_ignored += 1;
                continue;
            }
            Err(e) => {
                log::warn!("Skipping {}: {}", note.relative_path, e);
                reconciler.hold_file(&note.relative_path);
                summary.notes_failed += 1;
                continue;
            }
        };

        let payloads = build_payloads(&record, &config.vault.name);
        if payloads.is_empty() {
            summary.notes_without_prompts += 1;
            continue;
        }

        match reconciler.sync_document(&payloads) {
            Ok(outcome) => {
                summary.absorb(&outcome);
                summary.notes_synced += 1;
            }
            Err(e) => {
                log::error!("Abandoning sync of {}: {}", note.relative_path, e);
                reconciler.hold_file(&note.relative_path);
                summary.notes_failed += 1;
            }
        }
    }

    let orphans = reconciler.orphans();
    if !orphans.is_empty() {
        log::warn!(
            "{} card(s) in Anki no longer match any note in the vault",
            orphans.len()
        );
        for card in &orphans {
            let key = card.key();
            log::warn!("  orphan: '{}' / '{}' ({})", key.expression, key.prompt, key.source_filename);
        }
    }
    summary.orphans = orphans.iter().map(|card| card.key()).collect();

    if config.anki.delete_orphans && !orphans.is_empty() {
        let ids: Vec<NoteId> = orphans.iter().map(|card| card.id).collect();
        match store.delete_cards(&ids) {
            Ok(()) => {
                log::info!("Deleted {} orphaned card(s)", ids.len());
                summary.orphans_deleted = ids.len();
            }
            Err(e) => log::error!("Failed to delete orphaned cards: {}", e),
        }
    }

    summary.duration_ms = start.elapsed().as_millis() as u64;
    log::info!(
        "Sync finished: {} created, {} deleted, {} unchanged, {} failed across {} note(s)",
        summary.cards_created,
        summary.cards_deleted,
        summary.cards_unchanged,
        summary.cards_failed,
        summary.notes_synced
    );

    Ok(summary)
}
