use anyhow::{Context, Result};
use chrono::Utc;

use gramsync_lib::report::generate_report;

use crate::app::App;
use crate::render::terminal::render_report_outcome;
use crate::OutputFormat;

/// Rebuild the study report from current Anki data, without syncing
pub fn run(app: &App, format: &OutputFormat, use_color: bool) -> Result<()> {
    let outcome = generate_report(&app.store, &app.config, Utc::now())
        .context("Report generation failed")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
        OutputFormat::Plain => println!("{}", render_report_outcome(&outcome, use_color)),
    }

    Ok(())
}
