use anyhow::{Context, Result};
use chrono::Utc;

use gramsync_lib::report::generate_report;
use gramsync_lib::sync::{run_preflight, sync_vault};

use crate::app::App;
use crate::render::terminal::{render_preflight, render_report_outcome, render_sync_summary};
use crate::OutputFormat;

/// Full run: preflight, sync, then the study report
pub fn run(app: &App, format: &OutputFormat, use_color: bool) -> Result<()> {
    let preflight = run_preflight(&app.store, &app.config.anki).context("Preflight failed")?;
    let summary = sync_vault(&app.store, &app.config).context("Sync failed")?;
    let report = generate_report(&app.store, &app.config, Utc::now());

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "preflight": preflight,
                "sync": summary,
                "report": report.as_ref().ok(),
                "reportError": report.as_ref().err().map(|e| e.to_string()),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            println!(
                "{}",
                render_preflight(&preflight, &app.config.anki.deck, &app.config.anki.note_type, use_color)
            );
            println!();
            println!("{}", render_sync_summary(&summary, use_color));
            if let Ok(outcome) = &report {
                println!();
                println!("{}", render_report_outcome(outcome, use_color));
            }
        }
    }

    report.context("Report generation failed")?;
    Ok(())
}
