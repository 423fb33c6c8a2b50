mod app;
mod commands;
mod logging;
mod render;

use std::io::IsTerminal;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "gramsync",
    about = "Sync Obsidian grammar notes into Anki and write a study summary",
    version
)]
struct Cli {
    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Check that Anki is reachable and the deck and note type are ready
    Check,

    /// Regenerate the study report without syncing
    Report,

    /// Write a default config file if none exists
    InitConfig,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let use_color = !cli.no_color && std::io::stdout().is_terminal();

    match cli.command {
        Some(Command::InitConfig) => {
            logging::init_stderr();
            commands::init::run(&cli.format, use_color)?;
        }
        None => {
            let app = app::App::new()?;
            commands::sync::run(&app, &cli.format, use_color)?;
        }
        Some(Command::Check) => {
            let app = app::App::new()?;
            commands::check::run(&app, &cli.format, use_color)?;
        }
        Some(Command::Report) => {
            let app = app::App::new()?;
            commands::report::run(&app, &cli.format, use_color)?;
        }
    }

    Ok(())
}
