//! Data models for synced flashcards

use std::collections::BTreeMap;

use chrono::{DateTime, Local, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};

pub const FIELD_EXPRESSION: &str = "AnkiExpression";
pub const FIELD_PROMPT: &str = "EnglishSituationPrompt";
pub const FIELD_MEANING: &str = "Meaning";
pub const FIELD_STRUCTURE: &str = "Structure";
pub const FIELD_EXAMPLES_JP: &str = "ExamplesJP";
pub const FIELD_EXAMPLES_EN: &str = "ExamplesEN";
pub const FIELD_USAGE_NOTES: &str = "UsageNotes";
pub const FIELD_FILENAME: &str = "ObsidianFilename";
pub const FIELD_MOD_TIME: &str = "ObsidianModTime";
pub const FIELD_VAULT_NAME: &str = "ObsidianVaultName";

/// Fields the Anki note type must define, in order
pub const NOTE_FIELDS: [&str; 10] = [
    FIELD_EXPRESSION,
    FIELD_PROMPT,
    FIELD_MEANING,
    FIELD_STRUCTURE,
    FIELD_EXAMPLES_JP,
    FIELD_EXAMPLES_EN,
    FIELD_USAGE_NOTES,
    FIELD_FILENAME,
    FIELD_MOD_TIME,
    FIELD_VAULT_NAME,
];

/// Tag attached to every card this tool creates
pub const SYNC_TAG: &str = "obsidian_sync";

/// Anki note id
pub type NoteId = u64;

/// Identity used to match a payload against cards already in Anki
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvenanceKey {
    pub expression: String,
    pub prompt: String,
    pub source_filename: String,
}

/// One card to be written to Anki, built from a single prompt of a note
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardPayload {
    pub expression: String,
    pub prompt: String,
    pub meaning: String,
    pub structure: String,
    pub examples_jp: String,
    pub examples_en: String,
    pub usage_notes: String,
    pub source_filename: String,
    pub source_mod_time: DateTime<Utc>,
    pub vault_name: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl CardPayload {
    pub fn key(&self) -> ProvenanceKey {
        ProvenanceKey {
            expression: self.expression.clone(),
            prompt: self.prompt.clone(),
            source_filename: self.source_filename.clone(),
        }
    }

    /// The ten note fields, keyed by field name
    pub fn to_fields(&self) -> BTreeMap<String, String> {
        let values = [
            self.expression.clone(),
            self.prompt.clone(),
            self.meaning.clone(),
            self.structure.clone(),
            self.examples_jp.clone(),
            self.examples_en.clone(),
            self.usage_notes.clone(),
            self.source_filename.clone(),
            format_mod_time(self.source_mod_time),
            self.vault_name.clone(),
        ];

        NOTE_FIELDS
            .iter()
            .map(|name| name.to_string())
            .zip(values)
            .collect()
    }
}

pub fn format_mod_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored `ObsidianModTime` value.
///
/// Accepts RFC 3339 and naive ISO-8601 timestamps (interpreted as local
/// time).
pub fn parse_mod_time(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(time) = DateTime::parse_from_rfc3339(value) {
        return Some(time.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .map(|local| local.with_timezone(&Utc))
}

/// A note as it currently exists in Anki
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCard {
    pub id: NoteId,
    pub fields: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deck_path: Option<String>,
}

impl RemoteCard {
    pub fn field(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or("")
    }

    pub fn key(&self) -> ProvenanceKey {
        ProvenanceKey {
            expression: self.field(FIELD_EXPRESSION).to_string(),
            prompt: self.field(FIELD_PROMPT).to_string(),
            source_filename: self.field(FIELD_FILENAME).to_string(),
        }
    }

    pub fn source_mod_time(&self) -> Option<DateTime<Utc>> {
        parse_mod_time(self.field(FIELD_MOD_TIME))
    }
}

/// Review statistics for one note
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStat {
    pub lapses: u32,
    /// Anki ease as a multiplier (2.5 = 250%)
    pub ease_factor: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_review: Option<DateTime<Utc>>,
    pub reps: u32,
}

impl ReviewStat {
    /// Whether the card has ever been reviewed
    pub fn has_history(&self) -> bool {
        self.reps > 0 || self.last_review.is_some()
    }
}

impl Default for ReviewStat {
    fn default() -> Self {
        Self {
            lapses: 0,
            ease_factor: 2.5,
            due: None,
            last_review: None,
            reps: 0,
        }
    }
}
