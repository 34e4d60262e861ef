//! Run-time settings shared by the match and catalog paths

use crate::error::ConfigError;
use crate::ports::Target;

/// Worker pool size when none is configured
pub const DEFAULT_WORKERS: usize = 8;

/// Settings for a single retrieval run, read-only once the run starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    /// Where records are inserted
    pub target: Target,
    /// Number of concurrent workers (match path only)
    pub workers: usize,
    /// Parse everything but skip every insert
    pub dry_run: bool,
}

impl RunSettings {
    pub fn new(target: Target) -> Self {
        Self {
            target,
            workers: DEFAULT_WORKERS,
            dry_run: false,
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        Ok(())
    }
}
