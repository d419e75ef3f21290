use chrono::Local;
use log::{LevelFilter, Metadata, Record, SetLoggerError};
use std::collections::HashSet;
use std::io::{self, Write};
use std::sync::OnceLock;

// Custom logger structure
#[derive(Debug)]
struct ArenaLogger {
    level: LevelFilter,
    debug_filters: Option<HashSet<String>>,
}

impl ArenaLogger {
    // Extracts the entity tag ("T07", "B12") the topic macros prefix messages with
    fn entity_context(message: &str) -> Option<&str> {
        let rest = message.strip_prefix('[')?;
        let end = rest.find(']')?;
        let tag = &rest[..end];
        let mut chars = tag.chars();
        let prefix = chars.next()?;
        let digits = chars.as_str();
        if matches!(prefix, 'T' | 'B') && !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
            Some(tag)
        } else {
            None
        }
    }
}

impl log::Log for ArenaLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        if metadata.level() <= self.level {
            // Debug filters only narrow debug and trace output
            if let Some(filters) = &self.debug_filters {
                if metadata.level() == log::Level::Debug || metadata.level() == log::Level::Trace {
                    return filters.contains(metadata.target())
                        || filters.iter().any(|f| metadata.target().starts_with(f));
                }
            }
            return true;
        }
        false
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let level_color = match record.level() {
            log::Level::Error => "\x1B[31m", // Red
            log::Level::Warn => "\x1B[33m",  // Yellow
            log::Level::Info => "\x1B[32m",  // Green
            log::Level::Debug => "\x1B[36m", // Cyan
            log::Level::Trace => "\x1B[35m", // Magenta
        };
        let reset = "\x1B[0m";
        let timestamp = Local::now().format("%H:%M:%S%.3f");

        let message = record.args().to_string();
        let entity = Self::entity_context(&message).is_some();

        let mut output = format!(
            "{timestamp} {level_color}{level:5}{reset} {target}{sep}{message}",
            level = record.level(),
            target = record.target(),
            sep = if entity { " " } else { ": " },
        );

        if let Some(module_path) = record.module_path() {
            if module_path != record.target() {
                output.push_str(&format!(" [{}]", module_path));
            }
        }

        // A closed stdout is not worth crashing the simulation over
        let mut stdout = io::stdout().lock();
        let _ = writeln!(stdout, "{}", output);
        let _ = stdout.flush();
    }

    fn flush(&self) {
        let _ = io::stdout().flush();
    }
}

static LOGGER: OnceLock<ArenaLogger> = OnceLock::new();

/// Installs the colourised logger. `debug_filter` is a comma separated list of
/// topics (tank, bullet, ai, collision, state) that restricts debug output.
pub fn init_logger(level: LevelFilter, debug_filter: Option<String>) -> Result<(), SetLoggerError> {
    let debug_filters = debug_filter.map(|filter_str| {
        filter_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<HashSet<String>>()
    });

    let logger = LOGGER.get_or_init(|| ArenaLogger {
        level,
        debug_filters,
    });

    log::set_logger(logger).map(|()| log::set_max_level(level))
}

// Helper macros for specific debug topics
#[macro_export]
macro_rules! debug_tank {
    ($id:expr, $($arg:tt)+) => {
        log::debug!(target: "tank", "[T{:02}] {}", $id, format_args!($($arg)+))
    };
}

#[macro_export]
macro_rules! debug_bullet {
    ($id:expr, $($arg:tt)+) => {
        log::debug!(target: "bullet", "[B{:02}] {}", $id, format_args!($($arg)+))
    };
}

#[macro_export]
macro_rules! debug_ai {
    ($id:expr, $($arg:tt)+) => {
        log::debug!(target: "ai", "[T{:02}] {}", $id, format_args!($($arg)+))
    };
}

#[macro_export]
macro_rules! debug_collision {
    ($($arg:tt)+) => {
        log::debug!(target: "collision", $($arg)+)
    };
}

#[macro_export]
macro_rules! debug_state {
    ($($arg:tt)+) => {
        log::debug!(target: "state", $($arg)+)
    };
}
