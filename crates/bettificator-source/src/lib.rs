//! Bettificator Source - football results site parsers
//!
//! Fetches a day's results page or a club catalog page and turns it into
//! [`MatchRecord`]s / [`ClubRecord`]s.
//!
//! # Example
//!
//! ```ignore
//! use bettificator_core::PageParser;
//! use bettificator_source::{MatchPageParser, SourceConfig};
//!
//! let parser = MatchPageParser::new(SourceConfig::default());
//! let day = chrono::NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
//! let page = parser.parse(&day)?;
//! println!("{} matches", page.len());
//! ```

pub mod config;
pub mod html;
pub mod parser;
pub mod records;

// Re-exports
pub use config::SourceConfig;
pub use parser::{ClubPageParser, HttpFetcher, MatchPageParser, PageFetcher};
pub use records::{ClubRecord, MatchRecord, MatchStatus};
