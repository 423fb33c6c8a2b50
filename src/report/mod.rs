//! Study report
//!
//! Reads review history for every managed card back out of Anki, buckets
//! the cards and writes a Markdown summary into the vault.

mod analysis;
mod writer;

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::anki::{AnkiError, FlashcardStore};
use crate::config::SyncConfig;

pub use analysis::{analyze, ReportEntry, StudyBuckets};
pub use writer::{render_report, write_report, ReportContext};

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to write report to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not read study data from Anki: {0}")]
    Anki(#[from] AnkiError),
}

/// What a report run produced
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportOutcome {
    pub path: PathBuf,
    pub cards_found: usize,
    pub cards_analyzed: usize,
    pub recent: usize,
    pub struggling: usize,
    pub due_soon: usize,
}

/// Fetch study data for the managed cards, then render and write the report
pub fn generate_report<S: FlashcardStore + ?Sized>(
    store: &S,
    config: &SyncConfig,
    now: DateTime<Utc>,
) -> Result<ReportOutcome, ReportError> {
    let query = config.anki.managed_query();
    log::info!("Fetching study data for {}", query);

    let ids = store.find_cards(&query)?;
    if ids.is_empty() {
        log::warn!("No cards found in deck '{}'; the report will be empty", config.anki.deck);
    }
    let cards = store.get_fields_of(&ids)?;
    let stats = store.review_stats(&ids)?;

    let buckets = analyze(&cards, &stats, &config.study, now);
    let context = ReportContext {
        title: config.vault.report_title.clone(),
        deck: config.anki.deck.clone(),
        note_type: config.anki.note_type.clone(),
    };
    let content = render_report(&buckets, &context, now);

    let path = config.vault.report_path();
    write_report(&path, &content)?;

    Ok(ReportOutcome {
        path,
        cards_found: ids.len(),
        cards_analyzed: buckets.cards_analyzed,
        recent: buckets.recent.len(),
        struggling: buckets.struggling.len(),
        due_soon: buckets.due_soon.len(),
    })
}
