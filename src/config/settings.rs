use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Could not serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config directory not found")]
    NoConfigDir,

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Complete configuration for one run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub vault: VaultConfig,
    pub anki: AnkiConfig,
    pub study: StudyThresholds,
    pub log: LogConfig,
}

/// Where the source notes live and where the report goes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Vault root on disk
    pub path: PathBuf,
    /// Vault name as Obsidian knows it (used in deep links)
    pub name: String,
    /// Directory scanned for notes, relative to the vault root
    pub notes_dir: PathBuf,
    /// Directory the report is written to, relative to the vault root
    pub report_dir: PathBuf,
    pub report_filename: String,
    pub report_title: String,
    /// Frontmatter tag a note must carry to be synced
    pub eligibility_tag: String,
}

impl Default for VaultConfig {
    fn default() -> Self {
        let path = dirs::document_dir()
            .map(|p| p.join("Obsidian"))
            .unwrap_or_else(|| PathBuf::from("."));

        Self {
            path,
            name: "Current Notes".to_string(),
            notes_dir: PathBuf::from("2. Permanent Notes"),
            report_dir: PathBuf::from("4. Structure Notes"),
            report_filename: "Grammar Study Summary.md".to_string(),
            report_title: "Grammar Study Summary".to_string(),
            eligibility_tag: "grammarpoint".to_string(),
        }
    }
}

impl VaultConfig {
    pub fn notes_path(&self) -> PathBuf {
        self.path.join(&self.notes_dir)
    }

    pub fn report_path(&self) -> PathBuf {
        self.path.join(&self.report_dir).join(&self.report_filename)
    }
}

/// AnkiConnect target
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnkiConfig {
    pub url: String,
    /// Target deck (use `::` for sub-decks)
    pub deck: String,
    /// Note type name; must exist in Anki with every field in `NOTE_FIELDS`
    pub note_type: String,
    pub timeout_secs: u64,
    /// Sent as `options.allowDuplicate` on every `addNote`
    pub allow_duplicates: bool,
    /// Delete cards whose source note no longer exists
    pub delete_orphans: bool,
}

impl Default for AnkiConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8765".to_string(),
            deck: "1. Grammar::Japanese Grammar - Obsidian".to_string(),
            note_type: "Obsidian Grammar Sync".to_string(),
            timeout_secs: 30,
            allow_duplicates: true,
            delete_orphans: false,
        }
    }
}

impl AnkiConfig {
    /// Search query selecting every card this tool manages
    pub fn managed_query(&self) -> String {
        format!(
            "\"deck:{}\" \"note:{}\"",
            escape_query(&self.deck),
            escape_query(&self.note_type)
        )
    }
}

fn escape_query(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('*', "\\*")
        .replace('_', "\\_")
}

/// Upper bound for the report windows, in days
pub const MAX_WINDOW_DAYS: i64 = 36_500;

/// Thresholds for the study report buckets
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StudyThresholds {
    /// A card reviewed within this many days counts as recently studied
    pub recent_days: i64,
    /// Lapse count strictly above this marks a card as struggling
    pub struggling_lapses: u32,
    /// Ease factor below this marks a reviewed card as struggling
    pub struggling_ease: f32,
    /// Cards due within this many days are listed as due soon
    pub due_soon_days: i64,
}

impl Default for StudyThresholds {
    fn default() -> Self {
        Self {
            recent_days: 7,
            struggling_lapses: 2,
            struggling_ease: 2.0,
            due_soon_days: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    /// Append to the log file instead of truncating it each run
    pub append: bool,
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file: dirs::data_local_dir().map(|p| p.join("gramsync").join("gramsync.log")),
            append: false,
            level: "info".to_string(),
        }
    }
}

impl SyncConfig {
    /// Default config location: `<config_dir>/gramsync/config.toml`
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join("gramsync").join("config.toml"))
            .ok_or(ConfigError::NoConfigDir)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: SyncConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write this config to `path`, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.vault.name.trim().is_empty() {
            return Err(ConfigError::Invalid("vault.name must not be empty".to_string()));
        }
        if self.vault.report_filename.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "vault.report_filename must not be empty".to_string(),
            ));
        }
        if self.anki.deck.trim().is_empty() {
            return Err(ConfigError::Invalid("anki.deck must not be empty".to_string()));
        }
        if self.anki.note_type.trim().is_empty() {
            return Err(ConfigError::Invalid("anki.note_type must not be empty".to_string()));
        }
        for (name, days) in [
            ("study.recent_days", self.study.recent_days),
            ("study.due_soon_days", self.study.due_soon_days),
        ] {
            if !(1..=MAX_WINDOW_DAYS).contains(&days) {
                return Err(ConfigError::Invalid(format!(
                    "{} must be between 1 and {}",
                    name, MAX_WINDOW_DAYS
                )));
            }
        }
        Ok(())
    }
}
