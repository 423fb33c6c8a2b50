use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};

use anyhow::{Context, Result};
use env_logger::{Builder, Env, Target};

use gramsync_lib::config::LogConfig;

/// Copies every log line to stderr and the run's log file
struct TeeWriter {
    file: File,
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        self.file.flush()
    }
}

/// Log to stderr and, when configured, to a file.
///
/// `RUST_LOG` overrides the configured level.
pub fn init(config: &LogConfig) -> Result<()> {
    let mut builder = Builder::from_env(Env::default().default_filter_or(config.level.as_str()));
    builder.format_timestamp_secs();

    if let Some(path) = &config.file {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
        }

        let mut options = OpenOptions::new();
        options.create(true);
        if config.append {
            options.append(true);
        } else {
            options.write(true).truncate(true);
        }
        let file = options
            .open(path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;

        builder.target(Target::Pipe(Box::new(TeeWriter { file })));
    }

    builder.try_init().context("Logger already initialized")?;
    Ok(())
}

/// Plain stderr logging, for commands that run before a config exists
pub fn init_stderr() {
    let _ = Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .try_init();
}
