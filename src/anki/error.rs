//! AnkiConnect error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnkiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("AnkiConnect error (action: {action}): {message}")]
    Envelope { action: String, message: String },

    #[error("Anki rejected the note as a duplicate or empty: {0}")]
    DuplicateOrEmptyCard(String),

    #[error("Unexpected response for {action}: {message}")]
    UnexpectedResponse { action: String, message: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl AnkiError {
    /// Errors that mean the store could not be reached or refused the call
    pub fn is_transport(&self) -> bool {
        !matches!(self, AnkiError::DuplicateOrEmptyCard(_))
    }

    /// Actionable hint for common AnkiConnect failures
    pub fn hint(&self) -> Option<&'static str> {
        let message = match self {
            AnkiError::Http(e) if e.is_connect() || e.is_timeout() => {
                return Some("Is Anki running with the AnkiConnect add-on enabled?");
            }
            AnkiError::Envelope { message, .. } => message.to_lowercase(),
            AnkiError::DuplicateOrEmptyCard(message) => message.to_lowercase(),
            _ => return None,
        };

        if message.contains("collection is not available") {
            Some("Is Anki open with the correct profile loaded?")
        } else if message.contains("deck name conflicts") {
            Some("The deck name might conflict with an existing note type name.")
        } else if message.contains("model was not found") || message.contains("note type not found") {
            Some("The configured note type does not exist in Anki.")
        } else if message.contains("empty") {
            Some("Check the note type's fields and card templates.")
        } else {
            None
        }
    }
}

pub type Result<T> = std::result::Result<T, AnkiError>;
