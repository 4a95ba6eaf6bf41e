//! Minimal stderr logger for the command line tools.

use log::{Level, LevelFilter, Log, Metadata, Record};

/// Environment variable that selects the log level, e.g. `JBIG_LOG=debug`.
pub const LOG_LEVEL_VARIABLE: &str = "JBIG_LOG";

static LOGGER: SimpleLogger = SimpleLogger;

struct SimpleLogger;

impl Log for SimpleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let target = if !record.target().is_empty() {
            record.target()
        } else {
            record.module_path().unwrap_or_default()
        };
        let line = record.line().unwrap_or(0);
        let args = record.args();

        match record.level() {
            Level::Error => eprintln!("Error (in {}:{}): {}", target, line, args),
            Level::Warn => eprintln!("Warning (in {}:{}): {}", target, line, args),
            Level::Info => eprintln!("Info (in {}:{}): {}", target, line, args),
            Level::Debug => eprintln!("Debug (in {}:{}): {}", target, line, args),
            Level::Trace => eprintln!("Trace (in {}:{}): {}", target, line, args),
        }
    }

    fn flush(&self) {}
}

fn parse_level(value: &str) -> Option<LevelFilter> {
    match value.to_ascii_lowercase().as_str() {
        "off" => Some(LevelFilter::Off),
        "error" => Some(LevelFilter::Error),
        "warn" => Some(LevelFilter::Warn),
        "info" => Some(LevelFilter::Info),
        "debug" => Some(LevelFilter::Debug),
        "trace" => Some(LevelFilter::Trace),
        _ => None,
    }
}

/// Installs the logger at `Warn`, or at the level named by [`LOG_LEVEL_VARIABLE`].
pub fn init() {
    let level = std::env::var(LOG_LEVEL_VARIABLE)
        .ok()
        .and_then(|value| parse_level(&value))
        .unwrap_or(LevelFilter::Warn);
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("DEBUG"), Some(LevelFilter::Debug));
        assert_eq!(parse_level("off"), Some(LevelFilter::Off));
        assert_eq!(parse_level("loud"), None);
    }
}
