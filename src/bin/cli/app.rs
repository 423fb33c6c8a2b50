use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use gramsync_lib::anki::AnkiConnectClient;
use gramsync_lib::config::SyncConfig;

use crate::logging;

/// Shared application state for CLI commands
pub struct App {
    pub config: SyncConfig,
    pub config_path: PathBuf,
    pub store: AnkiConnectClient,
}

impl App {
    /// Load the config from its default location, start logging and build
    /// the AnkiConnect client
    pub fn new() -> Result<Self> {
        let config_path = SyncConfig::default_path().context("Failed to locate config directory")?;
        if !config_path.exists() {
            bail!(
                "No config file at {}. Run `gramsync init-config` to create one.",
                config_path.display()
            );
        }

        let config = SyncConfig::load(&config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

        logging::init(&config.log).context("Failed to initialize logging")?;
        log::info!("gramsync v{}", env!("CARGO_PKG_VERSION"));
        log::info!("Using config file: {}", config_path.display());

        let store = AnkiConnectClient::new(&config.anki).context("Failed to create AnkiConnect client")?;

        Ok(Self {
            config,
            config_path,
            store,
        })
    }
}
