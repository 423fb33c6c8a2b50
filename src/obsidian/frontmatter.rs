//! Frontmatter extraction for grammar notes
//!
//! Turns the YAML header of one Markdown note into a `SourceRecord`.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use thiserror::Error;

pub const KEY_EXPRESSION: &str = "ankiExpression";
pub const KEY_PROMPT: &str = "englishSituationPrompt";
pub const KEY_MEANING: &str = "meaning";
pub const KEY_STRUCTURE: &str = "structure";
pub const KEY_EXAMPLES_JP: &str = "exampleSentences";
pub const KEY_EXAMPLES_EN: &str = "exampleSentencesEnglish";
pub const KEY_USAGE_NOTES: &str = "usageNotes";
pub const KEY_TAGS: &str = "tags";

const NOT_AVAILABLE: &str = "N/A";

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Malformed frontmatter in {file}: {reason}")]
    MalformedHeader { file: String, reason: String },

    #[error("Missing required field '{field}' in {file}")]
    MissingRequiredField { file: String, field: &'static str },
}

/// One grammar note, as read from the vault
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRecord {
    pub expression: String,
    /// Situation prompts in header order
    pub prompts: Vec<String>,
    pub meaning: String,
    pub structure: String,
    pub examples_jp: String,
    pub examples_en: String,
    pub usage_notes: String,
    /// Path relative to the vault root, `/`-separated
    pub source_filename: String,
    pub source_mod_time: DateTime<Utc>,
}

impl SourceRecord {
    pub fn is_eligible(&self) -> bool {
        !self.expression.trim().is_empty() && self.prompts.iter().any(|p| !p.trim().is_empty())
    }
}

type Frontmatter = HashMap<String, Value>;

/// Split YAML frontmatter from the body.
///
/// `Ok(None)` when the note has no header (or an empty one).
fn parse_frontmatter<'a>(
    content: &'a str,
    file: &str,
) -> Result<Option<(Frontmatter, &'a str)>, ExtractError> {
    let content = content.trim_start_matches('\u{feff}');
    if !content.starts_with("---") {
        return Ok(None);
    }

    let Some(end_idx) = content[3..].find("\n---") else {
        return Err(ExtractError::MalformedHeader {
            file: file.to_string(),
            reason: "no closing '---'".to_string(),
        });
    };

    let yaml_content = &content[3..3 + end_idx];
    let rest = content[3 + end_idx + 4..].trim_start();

    if yaml_content.trim().is_empty() {
        return Ok(None);
    }

    let value: Value =
        serde_yaml::from_str(yaml_content).map_err(|e| ExtractError::MalformedHeader {
            file: file.to_string(),
            reason: e.to_string(),
        })?;

    let Value::Mapping(mapping) = value else {
        return Err(ExtractError::MalformedHeader {
            file: file.to_string(),
            reason: "header is not a key-value mapping".to_string(),
        });
    };

    let frontmatter = mapping
        .into_iter()
        .filter_map(|(k, v)| k.as_str().map(|k| (k.to_string(), v)))
        .collect();

    Ok(Some((frontmatter, rest)))
}

/// Extract tags from frontmatter
fn extract_frontmatter_tags(frontmatter: &Frontmatter) -> Vec<String> {
    let mut tags = Vec::new();

    if let Some(value) = frontmatter.get(KEY_TAGS) {
        match value {
            Value::Sequence(seq) => {
                for item in seq {
                    if let Some(s) = scalar_to_string(item) {
                        tags.push(s);
                    }
                }
            }
            Value::String(s) => {
                // Tags might be comma-separated
                for tag in s.split(',') {
                    tags.push(tag.to_string());
                }
            }
            _ => {}
        }
    }

    tags.into_iter()
        .map(|t| t.trim().trim_start_matches('#').to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_to_string(&tagged.value),
        _ => None,
    }
}

/// A header value that may be a single scalar or a list of scalars
fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Sequence(seq)) => seq
            .iter()
            .filter_map(scalar_to_string)
            .map(|s| s.trim().to_string())
            .collect(),
        Some(other) => scalar_to_string(other)
            .map(|s| vec![s.trim().to_string()])
            .unwrap_or_default(),
        None => Vec::new(),
    }
}

fn text_or_na(value: Option<&Value>) -> String {
    value
        .and_then(scalar_to_string)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Pad both example lists to the same length and join each with newlines
fn paired_examples(mut jp: Vec<String>, mut en: Vec<String>) -> (String, String) {
    let len = jp.len().max(en.len());
    jp.resize(len, String::new());
    en.resize(len, String::new());
    (jp.join("\n"), en.join("\n"))
}

/// Parse one note into a `SourceRecord`.
///
/// Returns `Ok(None)` for notes without a header or without
/// `eligibility_tag` among their frontmatter tags.
pub fn extract_record(
    content: &str,
    source_filename: &str,
    source_mod_time: DateTime<Utc>,
    eligibility_tag: &str,
) -> Result<Option<SourceRecord>, ExtractError> {
    let Some((frontmatter, _body)) = parse_frontmatter(content, source_filename)? else {
        return Ok(None);
    };

    let tags = extract_frontmatter_tags(&frontmatter);
    if !tags.iter().any(|t| t == eligibility_tag) {
        return Ok(None);
    }

    let Some(prompt_value) = frontmatter.get(KEY_PROMPT) else {
        return Err(ExtractError::MissingRequiredField {
            file: source_filename.to_string(),
            field: KEY_PROMPT,
        });
    };
    let prompts: Vec<String> = string_list(Some(prompt_value))
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect();

    let mut expression = frontmatter
        .get(KEY_EXPRESSION)
        .and_then(scalar_to_string)
        .map(|s| s.trim().to_string())
        .unwrap_or_default();
    if expression.is_empty() {
        expression = Path::new(source_filename)
            .file_stem()
            .map(|s| s.to_string_lossy().trim().to_string())
            .unwrap_or_default();
        if expression.is_empty() {
            return Err(ExtractError::MissingRequiredField {
                file: source_filename.to_string(),
                field: KEY_EXPRESSION,
            });
        }
        log::warn!(
            "'{}' missing or empty in {}; using filename '{}' as identifier",
            KEY_EXPRESSION,
            source_filename,
            expression
        );
    }

    let (examples_jp, examples_en) = paired_examples(
        string_list(frontmatter.get(KEY_EXAMPLES_JP)),
        string_list(frontmatter.get(KEY_EXAMPLES_EN)),
    );

    let usage: Vec<String> = string_list(frontmatter.get(KEY_USAGE_NOTES))
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect();
    let usage_notes = if usage.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        usage.join("\n")
    };

    Ok(Some(SourceRecord {
        expression,
        prompts,
        meaning: text_or_na(frontmatter.get(KEY_MEANING)),
        structure: text_or_na(frontmatter.get(KEY_STRUCTURE)),
        examples_jp,
        examples_en,
        usage_notes,
        source_filename: source_filename.to_string(),
        source_mod_time,
    }))
}
