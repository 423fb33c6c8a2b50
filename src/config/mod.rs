//! Run configuration
//!
//! Everything a run needs (vault paths, Anki target, study thresholds, log
//! file) is read once from a TOML file and handed to each component.

mod settings;

pub use settings::*;
