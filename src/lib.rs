pub mod anki;
pub mod config;
pub mod flashcards;
pub mod obsidian;
pub mod report;
pub mod sync;
