//! Sequential walk over the club catalog
//!
//! The catalog is split into one page per leading letter plus one bucket for
//! names starting with anything else. The key space is small, so pages are
//! fetched one after the other and everything is inserted at the end in a
//! single batch.

use std::fmt;
use std::time::{Duration, Instant};

use indicatif::ProgressBar;

use crate::error::RunError;
use crate::ports::{PageParser, RecordSink};
use crate::settings::RunSettings;
use crate::shutdown::is_shutdown_requested;

/// One catalog page: a letter `A`..`Z` or the non-alphabetic bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogKey {
    Letter(char),
    Other,
}

impl CatalogKey {
    /// Total number of catalog pages
    pub const COUNT: usize = 27;

    /// Label of the non-alphabetic bucket
    pub const OTHER_LABEL: char = '1';

    /// Every key in walk order: `A`..`Z`, then the bucket
    pub fn all() -> impl ExactSizeIterator<Item = CatalogKey> {
        (0..Self::COUNT).map(|i| match i {
            0..=25 => CatalogKey::Letter((b'A' + i as u8) as char),
            _ => CatalogKey::Other,
        })
    }

    /// Key a club name is filed under
    pub fn for_name(name: &str) -> Self {
        match name.trim_start().chars().next() {
            Some(c) if c.is_ascii_alphabetic() => CatalogKey::Letter(c.to_ascii_uppercase()),
            _ => CatalogKey::Other,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            CatalogKey::Letter(c) => *c,
            CatalogKey::Other => Self::OTHER_LABEL,
        }
    }
}

impl fmt::Display for CatalogKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Where a catalog walk currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogState {
    Idle,
    Walking(usize),
    Accumulated,
    Persisted,
    Skipped,
    Aborted,
}

impl CatalogState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Persisted | Self::Skipped | Self::Aborted)
    }
}

/// Result of a completed catalog walk
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogOutcome {
    pub keys_walked: usize,
    pub records: usize,
    pub inserted: usize,
    pub state: CatalogState,
    pub elapsed: Duration,
}

impl CatalogOutcome {
    pub fn log(&self) {
        log::info!("=== Catalog Summary ===");
        log::info!("Pages: {}/{}", self.keys_walked, CatalogKey::COUNT);
        match self.state {
            CatalogState::Skipped => {
                log::info!("Clubs: {} parsed (dry run, nothing inserted)", self.records)
            }
            _ => log::info!("Clubs: {} parsed, {} inserted", self.records, self.inserted),
        }
        log::info!("Time: {:.1}s", self.elapsed.as_secs_f64());
    }
}

/// Single-task walk over every [`CatalogKey`]
pub struct CatalogWalk<'a> {
    settings: &'a RunSettings,
    state: CatalogState,
    progress: ProgressBar,
}

impl<'a> CatalogWalk<'a> {
    pub fn new(settings: &'a RunSettings) -> Self {
        Self {
            settings,
            state: CatalogState::Idle,
            progress: ProgressBar::hidden(),
        }
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    pub fn state(&self) -> CatalogState {
        self.state
    }

    /// Fetch every page, then insert the accumulated clubs once.
    ///
    /// Any parse or insert failure aborts the walk.
    pub fn run<P, S>(&mut self, parser: &P, sink: &S) -> Result<CatalogOutcome, RunError>
    where
        P: PageParser<CatalogKey>,
        S: RecordSink<P::Record>,
    {
        let result = self.walk(parser, sink);
        if result.is_err() {
            self.state = CatalogState::Aborted;
            self.progress.abandon();
        }
        result
    }

    fn walk<P, S>(&mut self, parser: &P, sink: &S) -> Result<CatalogOutcome, RunError>
    where
        P: PageParser<CatalogKey>,
        S: RecordSink<P::Record>,
    {
        let start = Instant::now();
        let mut clubs = Vec::new();
        let mut keys_walked = 0;

        for (idx, key) in CatalogKey::all().enumerate() {
            if is_shutdown_requested() {
                return Err(RunError::Interrupted {
                    completed: keys_walked,
                    total: CatalogKey::COUNT,
                });
            }
            self.state = CatalogState::Walking(idx);
            self.progress.set_message(key.to_string());

            let page = parser.parse(&key).map_err(RunError::Parse)?;
            log::debug!("catalog {key}: {} clubs", page.len());
            clubs.extend(page.records);
            keys_walked += 1;
            self.progress.inc(1);
        }
        self.state = CatalogState::Accumulated;
        log::info!("Catalog walked: {} clubs on {} pages", clubs.len(), keys_walked);

        let inserted = if self.settings.dry_run {
            self.state = CatalogState::Skipped;
            0
        } else {
            let n = sink
                .insert(&self.settings.target, &clubs)
                .map_err(|source| RunError::Persist {
                    key: "catalog".to_string(),
                    source,
                })?;
            self.state = CatalogState::Persisted;
            n
        };
        self.progress.finish_with_message("done");

        Ok(CatalogOutcome {
            keys_walked,
            records: clubs.len(),
            inserted,
            state: self.state,
            elapsed: start.elapsed(),
        })
    }
}
