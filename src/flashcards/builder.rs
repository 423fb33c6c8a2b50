//! Expands a grammar note into one card payload per situation prompt

use crate::obsidian::SourceRecord;

use super::models::{CardPayload, SYNC_TAG};

/// Anki tags may not contain whitespace
fn expression_tag(expression: &str) -> String {
    format!(
        "expr_{}",
        expression.split_whitespace().collect::<Vec<_>>().join("_")
    )
}

/// Build the payloads for a record, one per prompt and in prompt order.
///
/// Identical prompts produce identical payloads; whether Anki keeps both is
/// up to its duplicate setting.
pub fn build_payloads(record: &SourceRecord, vault_name: &str) -> Vec<CardPayload> {
    if record.prompts.is_empty() {
        log::warn!(
            "No situation prompts in {}; no cards generated for '{}'",
            record.source_filename,
            record.expression
        );
        return Vec::new();
    }

    let tags = vec![SYNC_TAG.to_string(), expression_tag(&record.expression)];

    record
        .prompts
        .iter()
        .map(|prompt| CardPayload {
            expression: record.expression.clone(),
            prompt: prompt.clone(),
            meaning: record.meaning.clone(),
            structure: record.structure.clone(),
            examples_jp: record.examples_jp.clone(),
            examples_en: record.examples_en.clone(),
            usage_notes: record.usage_notes.clone(),
            source_filename: record.source_filename.clone(),
            source_mod_time: record.source_mod_time,
            vault_name: vault_name.to_string(),
            tags: tags.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flashcards::models::{FIELD_MOD_TIME, FIELD_PROMPT, NOTE_FIELDS};
    use chrono::{TimeZone, Utc};

    fn record(prompts: &[&str]) -> SourceRecord {
        SourceRecord {
            expression: "〜ても".to_string(),
            prompts: prompts.iter().map(|p| p.to_string()).collect(),
            meaning: "even if".to_string(),
            structure: "Verb-て + も".to_string(),
            examples_jp: "雨が降っても行きます。".to_string(),
            examples_en: "Even if it rains, I'll go.".to_string(),
            usage_notes: "N/A".to_string(),
            source_filename: "Grammar/ても.md".to_string(),
            source_mod_time: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_one_payload_per_prompt_in_order() {
        let payloads = build_payloads(&record(&["first", "second", "third"]), "Vault");

        assert_eq!(payloads.len(), 3);
        let prompts: Vec<&str> = payloads.iter().map(|p| p.prompt.as_str()).collect();
        assert_eq!(prompts, vec!["first", "second", "third"]);
        assert!(payloads.iter().all(|p| p.vault_name == "Vault"));
        assert!(payloads.iter().all(|p| p.expression == "〜ても"));
    }

    #[test]
    fn test_empty_prompts_yield_nothing() {
        assert!(build_payloads(&record(&[]), "Vault").is_empty());
    }

    #[test]
    fn test_duplicate_prompts_are_kept() {
        let payloads = build_payloads(&record(&["same", "same"]), "Vault");
        assert_eq!(payloads.len(), 2);
        assert_eq!(payloads[0].key(), payloads[1].key());
    }

    #[test]
    fn test_fields_match_note_type() {
        let payload = build_payloads(&record(&["Even if"]), "Vault").remove(0);
        let fields = payload.to_fields();

        assert_eq!(fields.len(), NOTE_FIELDS.len());
        for name in NOTE_FIELDS {
            assert!(fields.contains_key(name), "missing field {}", name);
        }
        assert_eq!(fields[FIELD_PROMPT], "Even if");
        assert_eq!(fields[FIELD_MOD_TIME], "2025-03-01T12:00:00.000000Z");
    }

    #[test]
    fn test_tags() {
        let mut rec = record(&["p"]);
        rec.expression = "〜て いる".to_string();
        let payload = build_payloads(&rec, "Vault").remove(0);
        assert_eq!(payload.tags, vec!["obsidian_sync".to_string(), "expr_〜て_いる".to_string()]);
    }
}
