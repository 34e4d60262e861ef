//! Bettificator Store - DuckDB persistence for scraped records
//!
//! Records are written as JSON documents, either to a local DuckDB file or
//! to a PostgreSQL database attached through DuckDB.

pub mod config;
pub mod sink;

pub use config::{DatabaseConfig, DatabaseKind};
pub use sink::{DuckdbSink, qualified_name, quote_ident};
