//! Vault traversal
//!
//! Walks the notes directory and yields every Markdown note with its
//! vault-relative path and modification time.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Notes directory not found: {0}")]
    NotesDirMissing(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A Markdown note read from disk
#[derive(Debug, Clone)]
pub struct VaultNote {
    pub path: PathBuf,
    /// Path relative to the vault root, `/`-separated
    pub relative_path: String,
    pub content: String,
    pub modified: DateTime<Utc>,
}

/// Truncate to whole microseconds so the value survives an RFC 3339 round trip
pub fn truncate_to_micros(time: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(time.timestamp_micros()).unwrap_or(time)
}

fn modified_time(path: &Path) -> DateTime<Utc> {
    match fs::metadata(path).and_then(|m| m.modified()) {
        Ok(time) => truncate_to_micros(DateTime::<Utc>::from(time)),
        Err(e) => {
            log::warn!(
                "Could not get modification time for {:?}: {}. Using current time.",
                path,
                e
            );
            truncate_to_micros(DateTime::<Utc>::from(SystemTime::now()))
        }
    }
}

/// Vault-relative path with forward slashes, or the absolute path when the
/// note lies outside the vault
fn relative_to_vault(path: &Path, vault_path: &Path) -> String {
    let relative = match path.strip_prefix(vault_path) {
        Ok(relative) => relative,
        Err(_) => {
            log::warn!(
                "{:?} is not inside vault {:?}; storing absolute path",
                path,
                vault_path
            );
            path
        }
    };

    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Collect every Markdown note under `notes_dir`.
///
/// Hidden files and the `.obsidian` config folder are skipped. Files that
/// cannot be read are logged and left out.
pub fn scan_notes(vault_path: &Path, notes_dir: &Path) -> Result<Vec<VaultNote>, ScanError> {
    if !notes_dir.is_dir() {
        return Err(ScanError::NotesDirMissing(notes_dir.to_path_buf()));
    }

    let mut notes = Vec::new();

    for entry in WalkDir::new(notes_dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        let relative = path.strip_prefix(notes_dir).unwrap_or(path);

        // Skip .obsidian config folder and hidden files
        if relative.starts_with(".obsidian")
            || relative
                .components()
                .any(|c| c.as_os_str().to_string_lossy().starts_with('.'))
        {
            continue;
        }

        if !entry.file_type().is_file() {
            continue;
        }

        let extension = path.extension().map(|e| e.to_string_lossy().to_lowercase());
        if !matches!(extension.as_deref(), Some("md") | Some("markdown")) {
            continue;
        }

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                log::error!("Error reading {:?}: {}", path, e);
                continue;
            }
        };

        notes.push(VaultNote {
            path: path.to_path_buf(),
            relative_path: relative_to_vault(path, vault_path),
            content,
            modified: modified_time(path),
        });
    }

    log::info!("Found {} markdown files in {:?}", notes.len(), notes_dir);
    Ok(notes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{SubsecRound, TimeZone};
    use tempfile::TempDir;

    #[test]
    fn test_scan_finds_markdown_recursively() {
        let temp = TempDir::new().unwrap();
        let vault = temp.path();
        let notes_dir = vault.join("Permanent");
        fs::create_dir_all(notes_dir.join("N5")).unwrap();
        fs::create_dir_all(notes_dir.join(".obsidian")).unwrap();

        fs::write(notes_dir.join("ても.md"), "---\ntags: [grammarpoint]\n---\n").unwrap();
        fs::write(notes_dir.join("N5").join("ながら.md"), "body").unwrap();
        fs::write(notes_dir.join("image.png"), [0u8, 1, 2]).unwrap();
        fs::write(notes_dir.join(".hidden.md"), "hidden").unwrap();
        fs::write(notes_dir.join(".obsidian").join("workspace.md"), "cfg").unwrap();

        let notes = scan_notes(vault, &notes_dir).unwrap();
        let paths: Vec<&str> = notes.iter().map(|n| n.relative_path.as_str()).collect();

        assert_eq!(paths, vec!["Permanent/N5/ながら.md", "Permanent/ても.md"]);
        assert_eq!(notes[0].content, "body");
    }

    #[test]
    fn test_missing_notes_dir() {
        let temp = TempDir::new().unwrap();
        let result = scan_notes(temp.path(), &temp.path().join("missing"));
        assert!(matches!(result, Err(ScanError::NotesDirMissing(_))));
    }

    #[test]
    fn test_modified_time_is_truncated() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("a.md");
        fs::write(&file, "x").unwrap();

        let modified = modified_time(&file);
        assert_eq!(modified, modified.trunc_subsecs(6));
    }

    #[test]
    fn test_truncate_to_micros() {
        let time = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();
        let truncated = truncate_to_micros(time);
        assert_eq!(truncated.timestamp_subsec_nanos(), 123_456_000);
    }
}
