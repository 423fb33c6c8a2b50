use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::AnkiConfig;
use crate::flashcards::{CardPayload, NoteId, RemoteCard, ReviewStat};

use super::error::{AnkiError, Result};
use super::store::FlashcardStore;

const API_VERSION: u32 = 6;

/// `{result, error}` envelope wrapped around every AnkiConnect reply
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub result: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn into_result(self, action: &str) -> Result<Option<T>> {
        match self.error {
            Some(message) => Err(AnkiError::Envelope {
                action: action.to_string(),
                message,
            }),
            None => Ok(self.result),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldValue {
    pub value: String,
    #[serde(default)]
    pub order: u32,
}

/// One entry of a `notesInfo` reply. Unknown ids come back as `{}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteInfo {
    #[serde(default)]
    pub note_id: Option<NoteId>,
    #[serde(default)]
    pub model_name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub fields: HashMap<String, FieldValue>,
    #[serde(default)]
    pub cards: Vec<u64>,
}

/// One entry of a `cardsInfo` reply
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardInfo {
    pub card_id: u64,
    pub note: NoteId,
    #[serde(default)]
    pub deck_name: String,
    /// Days for review cards, negative seconds for learning cards
    #[serde(default)]
    pub interval: i64,
    #[serde(default)]
    pub due: i64,
    #[serde(default)]
    pub lapses: u32,
    #[serde(default)]
    pub reps: u32,
    /// Ease in permille (2500 = 250%)
    #[serde(default)]
    pub factor: u32,
    #[serde(rename = "type", default)]
    pub card_type: i32,
    #[serde(default)]
    pub queue: i32,
    #[serde(rename = "mod", default)]
    pub modified: i64,
}

/// One entry of a `getReviewsOfCards` reply
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewLogEntry {
    /// Review time in epoch milliseconds
    pub id: i64,
    #[serde(default)]
    pub ease: i32,
    #[serde(default)]
    pub ivl: i64,
    #[serde(rename = "type", default)]
    pub review_type: i32,
}

/// Client for the AnkiConnect add-on
pub struct AnkiConnectClient {
    client: Client,
    url: String,
    allow_duplicates: bool,
}

impl AnkiConnectClient {
    pub fn new(config: &AnkiConfig) -> Result<Self> {
        let url = config.url.trim_end_matches('/').to_string();

        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(AnkiError::InvalidUrl(
                "URL must start with http:// or https://".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.timeout_secs.min(10)))
            .build()?;

        Ok(Self {
            client,
            url,
            allow_duplicates: config.allow_duplicates,
        })
    }

    fn invoke<T: DeserializeOwned>(&self, action: &str, params: Option<Value>) -> Result<Option<T>> {
        let body = request_body(action, params);
        log::debug!("AnkiConnect request: {}", action);

        let response: ApiResponse<T> = self
            .client
            .post(&self.url)
            .json(&body)
            .send()?
            .error_for_status()?
            .json()?;

        response.into_result(action)
    }

    fn invoke_required<T: DeserializeOwned>(&self, action: &str, params: Option<Value>) -> Result<T> {
        self.invoke(action, params)?
            .ok_or_else(|| AnkiError::UnexpectedResponse {
                action: action.to_string(),
                message: "result was null".to_string(),
            })
    }

    fn notes_info(&self, ids: &[NoteId]) -> Result<Vec<NoteInfo>> {
        self.invoke_required("notesInfo", Some(json!({ "notes": ids })))
    }

    fn cards_info(&self, card_ids: &[u64]) -> Result<Vec<CardInfo>> {
        if card_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.invoke_required("cardsInfo", Some(json!({ "cards": card_ids })))
    }

    fn reviews_of_cards(&self, card_ids: &[u64]) -> Result<HashMap<String, Vec<ReviewLogEntry>>> {
        if card_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let reviews: Option<HashMap<String, Vec<ReviewLogEntry>>> =
            self.invoke("getReviewsOfCards", Some(json!({ "cards": card_ids })))?;
        Ok(reviews.unwrap_or_default())
    }
}

pub fn request_body(action: &str, params: Option<Value>) -> Value {
    let mut body = serde_json::Map::new();
    body.insert("action".to_string(), Value::String(action.to_string()));
    body.insert("version".to_string(), Value::Number(API_VERSION.into()));

    if let Some(params) = params {
        body.insert("params".to_string(), params);
    }

    Value::Object(body)
}

/// Map an `addNote` envelope error onto the error taxonomy
fn classify_add_error(err: AnkiError) -> AnkiError {
    match err {
        AnkiError::Envelope { message, .. }
            if message.to_lowercase().contains("duplicate")
                || message.to_lowercase().contains("empty") =>
        {
            AnkiError::DuplicateOrEmptyCard(message)
        }
        other => other,
    }
}

pub fn note_params(
    payload: &CardPayload,
    deck: &str,
    note_type: &str,
    allow_duplicate: bool,
) -> Value {
    json!({
        "note": {
            "deckName": deck,
            "modelName": note_type,
            "fields": payload.to_fields(),
            "options": { "allowDuplicate": allow_duplicate },
            "tags": payload.tags,
        }
    })
}

fn to_remote_card(note: NoteInfo, decks: &HashMap<u64, String>) -> Option<RemoteCard> {
    let id = note.note_id?;
    let deck_path = note.cards.iter().find_map(|card| decks.get(card).cloned());
    let fields: BTreeMap<String, String> = note
        .fields
        .into_iter()
        .map(|(name, field)| (name, field.value))
        .collect();

    Some(RemoteCard { id, fields, deck_path })
}

fn epoch_millis(ms: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
}

/// When a card is next due.
///
/// Intraday learning cards store an epoch due time. Review and interday
/// learning cards store a day number relative to collection creation, which
/// AnkiConnect does not expose, so their due date is last review + interval.
/// New, suspended and buried cards have none.
pub fn card_due(card: &CardInfo, last_review: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    match card.queue {
        1 => DateTime::from_timestamp(card.due, 0),
        2 | 3 => last_review.map(|t| t + chrono::Duration::days(card.interval.max(1))),
        _ => None,
    }
}

/// Fold per-card info and review logs into one `ReviewStat` per note
pub fn aggregate_stats(
    cards: &[CardInfo],
    reviews: &HashMap<String, Vec<ReviewLogEntry>>,
) -> HashMap<NoteId, ReviewStat> {
    let mut stats: HashMap<NoteId, ReviewStat> = HashMap::new();
    let mut reviewed_ease: HashMap<NoteId, f32> = HashMap::new();

    for card in cards {
        let logged = reviews
            .get(&card.card_id.to_string())
            .and_then(|entries| entries.iter().map(|e| e.id).max())
            .and_then(epoch_millis);
        let last_review = logged.or_else(|| {
            if card.reps > 0 {
                DateTime::from_timestamp(card.modified, 0)
            } else {
                None
            }
        });
        let due = card_due(card, last_review);

        let stat = stats.entry(card.note).or_default();
        stat.lapses = stat.lapses.max(card.lapses);
        stat.reps += card.reps;
        stat.last_review = stat.last_review.max(last_review);
        stat.due = match (stat.due, due) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };

        if card.reps > 0 && card.factor > 0 {
            let ease = card.factor as f32 / 1000.0;
            let entry = reviewed_ease.entry(card.note).or_insert(ease);
            *entry = entry.min(ease);
        }
    }

    for (note, ease) in reviewed_ease {
        if let Some(stat) = stats.get_mut(&note) {
            stat.ease_factor = ease;
        }
    }

    stats
}

impl FlashcardStore for AnkiConnectClient {
    fn version(&self) -> Result<u32> {
        self.invoke_required("version", None)
    }

    fn deck_names(&self) -> Result<Vec<String>> {
        self.invoke_required("deckNames", None)
    }

    fn create_deck(&self, deck: &str) -> Result<u64> {
        self.invoke_required("createDeck", Some(json!({ "deck": deck })))
    }

    fn model_names(&self) -> Result<Vec<String>> {
        self.invoke_required("modelNames", None)
    }

    fn model_field_names(&self, model: &str) -> Result<Vec<String>> {
        self.invoke_required("modelFieldNames", Some(json!({ "modelName": model })))
    }

    fn find_cards(&self, query: &str) -> Result<Vec<NoteId>> {
        self.invoke_required("findNotes", Some(json!({ "query": query })))
    }

    fn get_fields_of(&self, ids: &[NoteId]) -> Result<Vec<RemoteCard>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let notes = self.notes_info(ids)?;
        let first_cards: Vec<u64> = notes.iter().filter_map(|n| n.cards.first().copied()).collect();
        let decks: HashMap<u64, String> = self
            .cards_info(&first_cards)?
            .into_iter()
            .map(|card| (card.card_id, card.deck_name))
            .collect();

        Ok(notes
            .into_iter()
            .filter_map(|note| to_remote_card(note, &decks))
            .collect())
    }

    fn add_card(&self, payload: &CardPayload, deck: &str, note_type: &str) -> Result<NoteId> {
        let params = note_params(payload, deck, note_type, self.allow_duplicates);
        self.invoke_required("addNote", Some(params))
            .map_err(classify_add_error)
    }

    fn delete_cards(&self, ids: &[NoteId]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let _: Option<Value> = self.invoke("deleteNotes", Some(json!({ "notes": ids })))?;
        Ok(())
    }

    fn review_stats(&self, ids: &[NoteId]) -> Result<HashMap<NoteId, ReviewStat>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let query = format!(
            "nid:{}",
            ids.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(",")
        );
        let card_ids: Vec<u64> = self.invoke_required("findCards", Some(json!({ "query": query })))?;
        let cards = self.cards_info(&card_ids)?;
        let reviews = self.reviews_of_cards(&card_ids)?;

        Ok(aggregate_stats(&cards, &reviews))
    }
}
