//! `log` backend for the binary
//!
//! Piped output gets plain `[LEVEL] message` lines. In a terminal each
//! record is colored and printed while the progress bars are suspended, so
//! the bars are redrawn below it intact.

use std::fmt;

use indicatif::MultiProgress;
use log::Level;

/// Fixed-width level tag
fn label(level: Level) -> &'static str {
    match level {
        Level::Error => "ERROR",
        Level::Warn => "WARN ",
        Level::Info => "INFO ",
        Level::Debug => "DEBUG",
        Level::Trace => "TRACE",
    }
}

fn ansi(level: Level) -> &'static str {
    match level {
        Level::Error => "\x1b[31m",
        Level::Warn => "\x1b[33m",
        Level::Info => "\x1b[32m",
        Level::Debug => "\x1b[36m",
        Level::Trace => "\x1b[35m",
    }
}

/// `--debug` wins, then quiet (TTY) mode, then info
fn default_level(quiet: bool, debug: bool) -> &'static str {
    match (debug, quiet) {
        (true, _) => "debug",
        (false, true) => "warn",
        (false, false) => "info",
    }
}

/// Colored line; debug and trace records also name their module
fn tty_line(level: Level, target: &str, args: &fmt::Arguments<'_>) -> String {
    let tag = format!("{}{}\x1b[0m", ansi(level), label(level));
    if level >= Level::Debug {
        format!("[{tag}] {target}: {args}")
    } else {
        format!("[{tag}] {args}")
    }
}

/// Prints records through a `MultiProgress` so lines don't tear the bars.
///
/// Filtering (`RUST_LOG`) is delegated to the wrapped env_logger.
pub struct IndicatifLogger {
    filter: env_logger::Logger,
    multi: MultiProgress,
}

impl IndicatifLogger {
    pub fn new(filter: env_logger::Logger, multi: MultiProgress) -> Self {
        Self { filter, multi }
    }
}

impl log::Log for IndicatifLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.filter.enabled(metadata)
    }

    fn log(&self, record: &log::Record) {
        if !self.filter.matches(record) {
            return;
        }
        let line = tty_line(record.level(), record.target(), record.args());
        self.multi.suspend(|| eprintln!("{line}"));
    }

    fn flush(&self) {}
}

/// Install the global logger. A second call is a no-op.
///
/// `RUST_LOG` overrides the computed default level.
pub fn init_logging(quiet: bool, debug: bool, multi: Option<&MultiProgress>) {
    use std::io::Write;

    let env = env_logger::Env::default().default_filter_or(default_level(quiet, debug));
    let mut builder = env_logger::Builder::from_env(env);

    match multi {
        Some(multi) => {
            let filter = builder.build();
            let max_level = filter.filter();
            let logger = IndicatifLogger::new(filter, multi.clone());
            if log::set_boxed_logger(Box::new(logger)).is_ok() {
                log::set_max_level(max_level);
            }
        }
        None => {
            let _ = builder
                .format(|buf, record| writeln!(buf, "[{}] {}", label(record.level()), record.args()))
                .try_init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_share_one_width() {
        for level in [Level::Error, Level::Warn, Level::Info, Level::Debug, Level::Trace] {
            assert_eq!(label(level).len(), 5);
        }
    }

    #[test]
    fn info_line_has_no_target() {
        let line = tty_line(Level::Info, "bettificator_core::dispatcher", &format_args!("go"));
        assert_eq!(line, "[\x1b[32mINFO \x1b[0m] go");
    }

    #[test]
    fn debug_line_names_module() {
        let line = tty_line(Level::Debug, "bettificator_core::dispatcher", &format_args!("#0"));
        assert!(line.ends_with("] bettificator_core::dispatcher: #0"));
        assert!(line.starts_with("[\x1b[36mDEBUG"));
    }

    #[test]
    fn debug_overrides_quiet() {
        assert_eq!(default_level(true, true), "debug");
        assert_eq!(default_level(true, false), "warn");
        assert_eq!(default_level(false, false), "info");
    }
}
