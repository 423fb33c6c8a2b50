use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Local, Utc};

use super::analysis::{ReportEntry, StudyBuckets};
use super::ReportError;
use crate::obsidian::obsidian_uri;

/// Header details for the rendered report
#[derive(Debug, Clone)]
pub struct ReportContext {
    pub title: String,
    pub deck: String,
    pub note_type: String,
}

pub fn render_report(buckets: &StudyBuckets, context: &ReportContext, now: DateTime<Utc>) -> String {
    let generated = now.with_timezone(&Local).format("%Y-%m-%d %H:%M");

    let mut out = String::new();
    let _ = writeln!(out, "# {} ({})", context.title, generated);
    let _ = writeln!(out);
    let _ = writeln!(out, "Analyzed Anki deck: `{}`", context.deck);
    let _ = writeln!(out, "Note type: `{}`", context.note_type);
    let _ = writeln!(out);

    render_section(&mut out, "Recently Studied Grammar Points", None, &buckets.recent);
    render_section(
        &mut out,
        "Needing More Attention Grammar Points",
        Some("(Based on lapses or low ease factor)"),
        &buckets.struggling,
    );
    render_section(
        &mut out,
        "Due Soon Grammar Points",
        Some("(Estimated based on Anki scheduling)"),
        &buckets.due_soon,
    );

    out
}

fn render_section(out: &mut String, heading: &str, note: Option<&str>, entries: &BTreeSet<ReportEntry>) {
    let _ = writeln!(out, "## {}", heading);
    if let Some(note) = note {
        let _ = writeln!(out, "{}", note);
    }

    if entries.is_empty() {
        let _ = writeln!(out, "- None");
        let _ = writeln!(out);
        return;
    }

    let _ = writeln!(out);
    let mut current: Option<&str> = None;
    for entry in entries {
        if current != Some(entry.expression.as_str()) {
            if current.is_some() {
                let _ = writeln!(out);
            }
            let _ = writeln!(out, "**{}:**", entry.expression);
            current = Some(entry.expression.as_str());
        }
        let _ = writeln!(
            out,
            "- [{} ({})]({})",
            escape_link_text(&entry.prompt),
            basename(&entry.source_filename),
            obsidian_uri(&entry.vault_name, &entry.source_filename)
        );
    }
    let _ = writeln!(out);
}

fn basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

fn escape_link_text(text: &str) -> String {
    text.replace('[', "\\[").replace(']', "\\]")
}

/// Overwrite the report at `path`, creating parent directories
pub fn write_report(path: &Path, content: &str) -> Result<(), ReportError> {
    let to_error = |source: std::io::Error| ReportError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(to_error)?;
    }
    fs::write(path, content).map_err(to_error)?;

    log::info!("Study summary report written to {}", path.display());
    Ok(())
}
