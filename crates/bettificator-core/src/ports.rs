//! Collaborator seams: page parsers produce records, sinks persist them

use std::fmt;

use crate::error::{ParseFailure, PersistFailure};

/// One day (or one catalog-page key) to be fetched, parsed and persisted.
///
/// `seq` is the position in enumeration order. A unit is moved into exactly
/// one worker through the job queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitOfWork<K> {
    pub seq: usize,
    pub key: K,
}

/// Records produced by the page parser for a single unit of work
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResult<R> {
    pub records: Vec<R>,
}

impl<R> FetchResult<R> {
    pub fn new(records: Vec<R>) -> Self {
        Self { records }
    }

    pub fn empty() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Database + table pair an insert is addressed to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub database: String,
    pub table: String,
}

impl Target {
    pub fn new(database: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            table: table.into(),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.table)
    }
}

/// Turns a unit-of-work key into structured records.
///
/// Called concurrently from several workers with distinct keys.
pub trait PageParser<K>: Sync {
    type Record: Send;

    fn parse(&self, key: &K) -> Result<FetchResult<Self::Record>, ParseFailure>;
}

/// Persists a batch of records as one insert operation.
///
/// Called concurrently from several workers; implementations that cannot
/// handle that must serialize internally. Returns the number of rows written.
pub trait RecordSink<R>: Sync {
    fn insert(&self, target: &Target, records: &[R]) -> Result<usize, PersistFailure>;
}
