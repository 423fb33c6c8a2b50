use gramsync_lib::report::ReportOutcome;
use gramsync_lib::sync::{PreflightReport, SyncSummary};

/// ANSI color codes
pub struct Color;

impl Color {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
}

pub fn paint(text: &str, color: &str, use_color: bool) -> String {
    if use_color {
        format!("{}{}{}", color, text, Color::RESET)
    } else {
        text.to_string()
    }
}

fn heading(text: &str, use_color: bool) -> String {
    paint(text, Color::BOLD, use_color)
}

/// Count colored only when it is non-zero
fn count(n: usize, color: &str, use_color: bool) -> String {
    if n == 0 {
        paint("0", Color::DIM, use_color)
    } else {
        paint(&n.to_string(), color, use_color)
    }
}

pub fn render_preflight(report: &PreflightReport, deck: &str, note_type: &str, use_color: bool) -> String {
    let ok = paint("ok", Color::GREEN, use_color);
    let deck_status = if report.deck_created {
        paint("created", Color::YELLOW, use_color)
    } else {
        ok.clone()
    };

    [
        heading("Preflight", use_color),
        format!("  AnkiConnect  v{} {}", report.anki_connect_version, ok),
        format!("  Deck         {} {}", deck, deck_status),
        format!("  Note type    {} {}", note_type, ok),
    ]
    .join("\n")
}

pub fn render_sync_summary(summary: &SyncSummary, use_color: bool) -> String {
    let mut lines = vec![
        heading("Sync", use_color),
        format!(
            "  Notes   {} scanned, {} synced, {} ignored, {} without prompts, {} failed",
            summary.notes_scanned,
            summary.notes_synced,
            summary.notes_ignored,
            count(summary.notes_without_prompts, Color::YELLOW, use_color),
            count(summary.notes_failed, Color::RED, use_color),
        ),
        format!(
            "  Cards   {} created, {} replaced, {} unchanged, {} failed",
            count(summary.cards_created, Color::GREEN, use_color),
            count(summary.cards_deleted, Color::YELLOW, use_color),
            summary.cards_unchanged,
            count(summary.cards_failed, Color::RED, use_color),
        ),
    ];

    if !summary.orphans.is_empty() {
        lines.push(format!(
            "  Orphans {} ({} deleted)",
            count(summary.orphans.len(), Color::YELLOW, use_color),
            summary.orphans_deleted
        ));
        for key in &summary.orphans {
            lines.push(paint(
                &format!("    {} / {} ({})", key.expression, key.prompt, key.source_filename),
                Color::DIM,
                use_color,
            ));
        }
    }

    lines.push(paint(
        &format!("  Finished in {:.1}s", summary.duration_ms as f64 / 1000.0),
        Color::DIM,
        use_color,
    ));
    lines.join("\n")
}

pub fn render_report_outcome(outcome: &ReportOutcome, use_color: bool) -> String {
    [
        heading("Report", use_color),
        format!(
            "  {} of {} card(s) with review history",
            outcome.cards_analyzed, outcome.cards_found
        ),
        format!(
            "  {} recent, {} needing attention, {} due soon",
            outcome.recent,
            count(outcome.struggling, Color::YELLOW, use_color),
            outcome.due_soon
        ),
        format!("  Written to {}", outcome.path.display()),
    ]
    .join("\n")
}
