//! Bettificator Core - date-range retrieval engine
//!
//! Splits a date range into per-day units of work, runs them through a
//! bounded worker pool (parse, then persist) and aggregates completion with
//! fail-fast semantics. Also provides the sequential club catalog walk and
//! the shared logging, progress and HTTP plumbing.

pub mod catalog;
pub mod date_range;
pub mod dispatcher;
pub mod error;
pub mod http;
pub mod logging;
pub mod outcome;
pub mod ports;
pub mod progress;
pub mod settings;
pub mod shutdown;

// Re-exports for convenience
pub use catalog::{CatalogKey, CatalogOutcome, CatalogState, CatalogWalk};
pub use date_range::{DateRange, parse_date};
pub use dispatcher::Dispatcher;
pub use error::{ConfigError, ParseFailure, PersistFailure, RunError};
pub use http::{HttpError, fetch_text};
pub use logging::{IndicatifLogger, init_logging};
pub use outcome::{DayReport, RunOutcome};
pub use ports::{FetchResult, PageParser, RecordSink, Target, UnitOfWork};
pub use progress::{ProgressContext, SharedProgress, fmt_num};
pub use settings::{DEFAULT_WORKERS, RunSettings};
pub use shutdown::{install_signal_handlers, is_shutdown_requested, request_shutdown, shutdown_flag};
