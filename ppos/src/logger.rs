// SPDX-License-Identifier: MPL-2.0

//! Logging support.
//!
//! The logger prints to the standard error stream. Messages are always
//! printed in their entirety without being mixed with messages generated
//! concurrently by other threads.
//!
//! The maximum level is read from the `PPOS_LOG_LEVEL` environment variable
//! (`error`, `warn`, `info`, `debug` or `trace`). Logging is off otherwise.

use alloc::format;
use std::{
    io::Write,
    sync::{Once, OnceLock},
    time::Instant,
};

use log::{LevelFilter, Metadata, Record};
use spin::Mutex as SpinLock;

const LOGGER: Logger = Logger {};

static START: OnceLock<Instant> = OnceLock::new();

struct Logger {}

impl log::Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let uptime = START.get_or_init(Instant::now).elapsed();
        let timestamp = format!("[{:>10.3}]", uptime.as_secs_f64());
        let level = format!("{:<5}", record.level());
        let record_str = format!("{}", record.args());

        #[cfg(feature = "log_color")]
        let (timestamp, level, record_str) = {
            use alloc::string::ToString;

            use owo_colors::OwoColorize;

            let timestamp = timestamp.green();
            let level = match record.level() {
                log::Level::Error => level.red().to_string(),
                log::Level::Warn => level.bright_yellow().to_string(),
                log::Level::Info => level.blue().to_string(),
                log::Level::Debug => level.bright_green().to_string(),
                log::Level::Trace => level.bright_black().to_string(),
            };
            let record_str = record_str.default_color();
            (timestamp, level, record_str)
        };

        static RECORD_LOCK: SpinLock<()> = SpinLock::new(());
        let _lock = RECORD_LOCK.lock();

        let _ = writeln!(std::io::stderr(), "{} {}: {}", timestamp, level, record_str);
    }

    fn flush(&self) {}
}

/// Initializes the logger.
///
/// Only the first call has an effect. If the application installed a logger
/// of its own, that logger is kept.
pub(crate) fn init() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        START.get_or_init(Instant::now);
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(get_log_level().unwrap_or(LevelFilter::Off));
        }
    });
}

fn get_log_level() -> Option<LevelFilter> {
    let value = std::env::var("PPOS_LOG_LEVEL").ok()?;
    Some(parse_level(&value))
}

fn parse_level(value: &str) -> LevelFilter {
    match value.trim().to_ascii_lowercase().as_str() {
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        // Otherwise, OFF
        _ => LevelFilter::Off,
    }
}
