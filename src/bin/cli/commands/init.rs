use anyhow::{Context, Result};

use gramsync_lib::config::SyncConfig;

use crate::render::terminal::{paint, Color};
use crate::OutputFormat;

/// Write the default config, leaving an existing file alone
pub fn run(format: &OutputFormat, use_color: bool) -> Result<()> {
    let path = SyncConfig::default_path().context("Failed to locate config directory")?;
    let created = !path.exists();

    if created {
        SyncConfig::default()
            .save(&path)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        log::info!("Wrote default config to {}", path.display());
    }

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "path": path,
                "created": created,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            if created {
                println!("{} {}", paint("Created", Color::GREEN, use_color), path.display());
                println!("Edit vault.path and vault.name before the first sync.");
            } else {
                println!("Config already exists at {}", path.display());
            }
        }
    }

    Ok(())
}
