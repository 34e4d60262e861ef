//! Error taxonomy for retrieval runs

use std::fmt;

use crate::ports::Target;

/// Invalid input detected before any unit of work is issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidDate { value: String, message: String },
    ZeroWorkers,
    UnknownDatabaseKind(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDate { value, message } => {
                write!(f, "invalid date '{value}' (expected YYYY-MM-DD): {message}")
            }
            Self::ZeroWorkers => write!(f, "worker count must be at least 1"),
            Self::UnknownDatabaseKind(kind) => {
                write!(f, "unknown database type '{kind}' (expected duckdb or postgres)")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// The page parser could not produce records for one unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    pub key: String,
    pub message: String,
}

impl ParseFailure {
    pub fn new(key: impl fmt::Display, message: impl Into<String>) -> Self {
        Self {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.message)
    }
}

impl std::error::Error for ParseFailure {}

/// The persistence sink rejected or could not perform an insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistFailure {
    pub target: String,
    pub message: String,
}

impl PersistFailure {
    pub fn new(target: &Target, message: impl Into<String>) -> Self {
        Self {
            target: target.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for PersistFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.target, self.message)
    }
}

impl std::error::Error for PersistFailure {}

/// Fatal outcome of a run. The first one observed wins.
#[derive(Debug)]
pub enum RunError {
    Config(ConfigError),
    Parse(ParseFailure),
    Persist { key: String, source: PersistFailure },
    /// The worker pool could not be started
    ThreadPool(String),
    WorkerPanicked,
    Interrupted { completed: usize, total: usize },
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "{e}"),
            Self::Parse(e) => write!(f, "parse failed for {e}"),
            Self::Persist { key, source } => write!(f, "persist failed for {key} into {source}"),
            Self::ThreadPool(msg) => write!(f, "failed to start worker pool: {msg}"),
            Self::WorkerPanicked => write!(f, "a worker panicked"),
            Self::Interrupted { completed, total } => {
                write!(f, "interrupted after {completed}/{total} units")
            }
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Parse(e) => Some(e),
            Self::Persist { source, .. } => Some(source),
            Self::ThreadPool(_) | Self::WorkerPanicked | Self::Interrupted { .. } => None,
        }
    }
}

impl From<ConfigError> for RunError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl RunError {
    /// Interrupted runs exit with 130, like a shell killed by SIGINT.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Interrupted { .. } => 130,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_pool_failure_exits_with_one() {
        let err = RunError::ThreadPool("out of threads".into());
        assert_eq!(err.to_string(), "failed to start worker pool: out of threads");
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn parse_failure_display_includes_key() {
        let err = RunError::Parse(ParseFailure::new("2020-01-01", "HTTP 500"));
        assert_eq!(err.to_string(), "parse failed for 2020-01-01: HTTP 500");
    }

    #[test]
    fn persist_failure_display_includes_target() {
        let target = Target::new("bets", "matches");
        let err = RunError::Persist {
            key: "2020-01-02".into(),
            source: PersistFailure::new(&target, "connection refused"),
        };
        let msg = err.to_string();
        assert!(msg.contains("2020-01-02"));
        assert!(msg.contains("bets.matches"));
    }

    #[test]
    fn source_is_exposed() {
        use std::error::Error;
        let err = RunError::Parse(ParseFailure::new("A", "bad page"));
        assert!(err.source().is_some());
        assert!(RunError::WorkerPanicked.source().is_none());
    }

    #[test]
    fn exit_codes() {
        assert_eq!(RunError::WorkerPanicked.exit_code(), 1);
        let err = RunError::Interrupted {
            completed: 1,
            total: 3,
        };
        assert_eq!(err.exit_code(), 130);
    }

    #[test]
    fn invalid_date_display() {
        let err = ConfigError::InvalidDate {
            value: "2020-13-01".into(),
            message: "input is out of range".into(),
        };
        assert!(err.to_string().contains("2020-13-01"));
    }
}
