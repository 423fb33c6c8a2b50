use anyhow::{Context, Result};

use gramsync_lib::sync::run_preflight;

use crate::app::App;
use crate::render::terminal::{paint, render_preflight, Color};
use crate::OutputFormat;

pub fn run(app: &App, format: &OutputFormat, use_color: bool) -> Result<()> {
    let preflight = run_preflight(&app.store, &app.config.anki).context("Preflight failed")?;
    let notes_path = app.config.vault.notes_path();
    let notes_dir_exists = notes_path.is_dir();

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "configPath": app.config_path,
                "preflight": preflight,
                "notesDir": notes_path,
                "notesDirExists": notes_dir_exists,
                "reportPath": app.config.vault.report_path(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            println!(
                "{}",
                render_preflight(&preflight, &app.config.anki.deck, &app.config.anki.note_type, use_color)
            );
            let status = if notes_dir_exists {
                paint("ok", Color::GREEN, use_color)
            } else {
                paint("missing", Color::RED, use_color)
            };
            println!("  Notes dir    {} {}", notes_path.display(), status);
            println!("  Report       {}", app.config.vault.report_path().display());
            println!("  Config       {}", app.config_path.display());
        }
    }

    if !notes_dir_exists {
        anyhow::bail!("Notes directory not found: {}", notes_path.display());
    }
    Ok(())
}
