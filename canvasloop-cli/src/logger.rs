//! Routes `log` records into the on-screen log panel while the terminal is
//! in raw mode.

use std::sync::{Arc, Mutex};

use log::{LevelFilter, Log, Metadata, Record};

use crate::state::LogBuffer;

pub struct BufferLogger {
    buffer: Arc<Mutex<LogBuffer>>,
    level: LevelFilter,
}

impl BufferLogger {
    pub fn new(buffer: Arc<Mutex<LogBuffer>>, level: LevelFilter) -> Self {
        Self { buffer, level }
    }
}

impl Log for BufferLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if let Ok(mut buffer) = self.buffer.lock() {
            buffer.push(
                format!("{}: {}", record.target(), record.args()),
                record.level(),
            );
        }
    }

    fn flush(&self) {}
}

/// `RUST_LOG` as a single level; anything else falls back to info.
pub fn level_from_env() -> LevelFilter {
    std::env::var("RUST_LOG")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(LevelFilter::Info)
}

pub fn install(buffer: Arc<Mutex<LogBuffer>>, level: LevelFilter) -> anyhow::Result<()> {
    log::set_boxed_logger(Box::new(BufferLogger::new(buffer, level)))?;
    log::set_max_level(level);
    Ok(())
}

/// Plain stderr logging for the non-interactive commands.
pub fn init_stderr() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}
