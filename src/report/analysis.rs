use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::config::StudyThresholds;
use crate::flashcards::{
    NoteId, RemoteCard, ReviewStat, FIELD_EXPRESSION, FIELD_FILENAME, FIELD_PROMPT,
    FIELD_VAULT_NAME,
};

/// One line of the study report.
///
/// Field order gives the sort order within a section.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEntry {
    pub expression: String,
    pub source_filename: String,
    pub prompt: String,
    pub vault_name: String,
}

impl ReportEntry {
    fn from_card(card: &RemoteCard) -> Option<Self> {
        let source_filename = card.field(FIELD_FILENAME).trim();
        let vault_name = card.field(FIELD_VAULT_NAME).trim();
        if source_filename.is_empty() || vault_name.is_empty() {
            return None;
        }

        Some(Self {
            expression: card.field(FIELD_EXPRESSION).to_string(),
            source_filename: source_filename.to_string(),
            prompt: card.field(FIELD_PROMPT).to_string(),
            vault_name: vault_name.to_string(),
        })
    }
}

/// Report buckets. A card can land in any number of them.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyBuckets {
    pub recent: BTreeSet<ReportEntry>,
    pub struggling: BTreeSet<ReportEntry>,
    pub due_soon: BTreeSet<ReportEntry>,
    /// Cards that had review history and usable provenance fields
    pub cards_analyzed: usize,
}

impl StudyBuckets {
    pub fn is_empty(&self) -> bool {
        self.recent.is_empty() && self.struggling.is_empty() && self.due_soon.is_empty()
    }
}

pub fn analyze(
    cards: &[RemoteCard],
    stats: &HashMap<NoteId, ReviewStat>,
    thresholds: &StudyThresholds,
    now: DateTime<Utc>,
) -> StudyBuckets {
    let mut buckets = StudyBuckets::default();
    let recent_cutoff = Duration::try_days(thresholds.recent_days)
        .and_then(|window| now.checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let due_horizon = Duration::try_days(thresholds.due_soon_days)
        .and_then(|window| now.checked_add_signed(window))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);

    for card in cards {
        let Some(stat) = stats.get(&card.id) else {
            log::debug!("No review data for note {}", card.id);
            continue;
        };
        if !stat.has_history() {
            continue;
        }
        let Some(entry) = ReportEntry::from_card(card) else {
            log::warn!(
                "Note {} is missing its Obsidian filename or vault name; leaving it out of the report",
                card.id
            );
            continue;
        };

        buckets.cards_analyzed += 1;

        if stat.last_review.is_some_and(|t| t >= recent_cutoff) {
            buckets.recent.insert(entry.clone());
        }

        let low_ease = stat.reps > 0 && stat.ease_factor < thresholds.struggling_ease;
        if stat.lapses > thresholds.struggling_lapses || low_ease {
            buckets.struggling.insert(entry.clone());
        }

        if stat.due.is_some_and(|due| due > now && due <= due_horizon) {
            buckets.due_soon.insert(entry);
        }
    }

    log::info!(
        "Analyzed {} card(s): {} recent, {} struggling, {} due soon",
        buckets.cards_analyzed,
        buckets.recent.len(),
        buckets.struggling.len(),
        buckets.due_soon.len()
    );

    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::BTreeMap;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 10, 9, 0, 0).unwrap()
    }

    fn card(id: NoteId, expression: &str, prompt: &str) -> RemoteCard {
        let mut fields = BTreeMap::new();
        fields.insert(FIELD_EXPRESSION.to_string(), expression.to_string());
        fields.insert(FIELD_PROMPT.to_string(), prompt.to_string());
        fields.insert(FIELD_FILENAME.to_string(), format!("Notes/{expression}.md"));
        fields.insert(FIELD_VAULT_NAME.to_string(), "Vault".to_string());
        RemoteCard { id, fields, deck_path: None }
    }

    fn reviewed(days_ago: i64) -> ReviewStat {
        ReviewStat {
            lapses: 0,
            ease_factor: 2.5,
            due: None,
            last_review: Some(now() - Duration::days(days_ago)),
            reps: 3,
        }
    }

    #[test]
    fn test_recent_window() {
        let cards = vec![card(1, "a", "p"), card(2, "b", "p")];
        let stats = HashMap::from([(1, reviewed(2)), (2, reviewed(8))]);

        let buckets = analyze(&cards, &stats, &StudyThresholds::default(), now());

        assert_eq!(buckets.recent.len(), 1);
        assert_eq!(buckets.recent.iter().next().unwrap().expression, "a");
    }

    #[test]
    fn test_struggling_regardless_of_due_date() {
        let cards = vec![card(1, "lapsed", "p"), card(2, "hard", "p"), card(3, "fine", "p")];
        let mut lapsed = reviewed(30);
        lapsed.lapses = 3;
        lapsed.due = Some(now() + Duration::days(40));
        let mut hard = reviewed(30);
        hard.ease_factor = 1.3;
        let mut fine = reviewed(30);
        fine.lapses = 2;

        let stats = HashMap::from([(1, lapsed), (2, hard), (3, fine)]);
        let buckets = analyze(&cards, &stats, &StudyThresholds::default(), now());

        let names: Vec<&str> = buckets.struggling.iter().map(|e| e.expression.as_str()).collect();
        assert_eq!(names, vec!["hard", "lapsed"]);
        assert!(buckets.due_soon.is_empty());
    }

    #[test]
    fn test_due_soon_horizon() {
        let cards = vec![
            card(1, "overdue", "p"),
            card(2, "tomorrow", "p"),
            card(3, "edge", "p"),
            card(4, "later", "p"),
        ];
        let with_due = |days: i64| ReviewStat {
            due: Some(now() + Duration::days(days)),
            ..reviewed(20)
        };
        let stats = HashMap::from([
            (1, with_due(-1)),
            (2, with_due(1)),
            (3, with_due(3)),
            (4, with_due(4)),
        ]);

        let buckets = analyze(&cards, &stats, &StudyThresholds::default(), now());
        let names: Vec<&str> = buckets.due_soon.iter().map(|e| e.expression.as_str()).collect();
        assert_eq!(names, vec!["edge", "tomorrow"]);
    }

    #[test]
    fn test_huge_windows_do_not_overflow() {
        let cards = vec![card(1, "old", "p")];
        let stats = HashMap::from([(
            1,
            ReviewStat {
                due: Some(now() + Duration::days(400)),
                ..reviewed(3650)
            },
        )]);
        let thresholds = StudyThresholds {
            recent_days: i64::MAX / 1000,
            due_soon_days: i64::MAX / 1000,
            ..StudyThresholds::default()
        };

        let buckets = analyze(&cards, &stats, &thresholds, now());
        assert_eq!(buckets.recent.len(), 1);
        assert_eq!(buckets.due_soon.len(), 1);
    }

    #[test]
    fn test_cards_without_history_are_excluded() {
        let cards = vec![card(1, "new", "p"), card(2, "unknown", "p")];
        let stats = HashMap::from([(
            1,
            ReviewStat {
                due: Some(now() + Duration::days(1)),
                ..ReviewStat::default()
            },
        )]);

        let buckets = analyze(&cards, &stats, &StudyThresholds::default(), now());
        assert!(buckets.is_empty());
        assert_eq!(buckets.cards_analyzed, 0);
    }

    #[test]
    fn test_missing_vault_name_is_excluded() {
        let mut orphaned = card(1, "a", "p");
        orphaned.fields.insert(FIELD_VAULT_NAME.to_string(), String::new());
        let stats = HashMap::from([(1, reviewed(1))]);

        let buckets = analyze(&[orphaned], &stats, &StudyThresholds::default(), now());
        assert!(buckets.recent.is_empty());
    }

    #[test]
    fn test_entries_sorted_by_expression_then_file_then_prompt() {
        let cards = vec![card(1, "b", "x"), card(2, "a", "z"), card(3, "a", "y")];
        let stats = HashMap::from([(1, reviewed(1)), (2, reviewed(1)), (3, reviewed(1))]);

        let buckets = analyze(&cards, &stats, &StudyThresholds::default(), now());
        let order: Vec<(&str, &str)> = buckets
            .recent
            .iter()
            .map(|e| (e.expression.as_str(), e.prompt.as_str()))
            .collect();
        assert_eq!(order, vec![("a", "y"), ("a", "z"), ("b", "x")]);
    }
}
