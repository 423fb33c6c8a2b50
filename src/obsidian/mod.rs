//! Obsidian vault access
//!
//! Handles reading grammar notes out of an Obsidian vault:
//! - Walking the notes folder for Markdown files
//! - Parsing YAML frontmatter into typed records
//! - Building `obsidian://` deep links back to notes

mod frontmatter;
mod scan;

pub use frontmatter::*;
pub use scan::*;

/// Deep link that opens `file` (vault-relative) in `vault`
pub fn obsidian_uri(vault_name: &str, file: &str) -> String {
    format!(
        "obsidian://open?vault={}&file={}",
        urlencoding::encode(vault_name),
        urlencoding::encode(file)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_obsidian_uri_encodes_components() {
        assert_eq!(
            obsidian_uri("Current Notes", "2. Permanent Notes/ても.md"),
            "obsidian://open?vault=Current%20Notes&file=2.%20Permanent%20Notes%2F%E3%81%A6%E3%82%82.md"
        );
    }
}
