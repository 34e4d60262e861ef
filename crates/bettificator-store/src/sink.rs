//! DuckDB-backed record sink
//!
//! Each record is stored as one JSON document in a `doc` column. Tables are
//! created on first insert. The connection is not `Sync`, so concurrent
//! inserts from the worker pool are serialized behind a mutex; each insert
//! runs in its own transaction.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result};
use bettificator_core::{PersistFailure, RecordSink, Target};
use duckdb::Connection;
use serde::Serialize;

use crate::config::{DatabaseConfig, DatabaseKind};

struct Inner {
    conn: Connection,
    /// Tables already created in this session
    ensured: HashSet<String>,
}

pub struct DuckdbSink {
    inner: Mutex<Inner>,
    endpoint: String,
}

impl std::fmt::Debug for DuckdbSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuckdbSink")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

/// Double-quote an identifier, escaping embedded quotes
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Fully qualified `"database"."table"` name
pub fn qualified_name(target: &Target) -> String {
    format!("{}.{}", quote_ident(&target.database), quote_ident(&target.table))
}

fn quote_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

impl DuckdbSink {
    /// Open the database described by `config`.
    ///
    /// Local files are named after the database, so the DuckDB catalog and
    /// `config.name` agree for both backends.
    pub fn open(config: &DatabaseConfig) -> Result<Self> {
        let conn = match config.kind {
            DatabaseKind::Duckdb => {
                std::fs::create_dir_all(&config.dir).with_context(|| {
                    format!("Failed to create database dir: {}", config.dir.display())
                })?;
                let path = config.file_path();
                Connection::open(&path)
                    .with_context(|| format!("Failed to open DuckDB file: {}", path.display()))?
            }
            DatabaseKind::Postgres => {
                let conn = Connection::open_in_memory()
                    .context("Failed to open DuckDB in-memory connection")?;
                conn.execute_batch("INSTALL postgres; LOAD postgres;")
                    .context("Failed to load DuckDB postgres extension")?;
                conn.execute_batch(&format!(
                    "ATTACH {} AS {} (TYPE POSTGRES);",
                    quote_literal(&config.postgres_dsn()),
                    quote_ident(&config.name)
                ))
                .with_context(|| format!("Failed to attach {}", config.endpoint()))?;
                conn
            }
        };
        log::info!("Connected to {}", config.endpoint());
        Ok(Self::from_connection(conn, config.endpoint()))
    }

    /// Fresh in-memory database; its catalog is named `memory`
    pub fn open_in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().context("Failed to open DuckDB in-memory connection")?;
        Ok(Self::from_connection(conn, ":memory:".to_string()))
    }

    fn from_connection(conn: Connection, endpoint: String) -> Self {
        Self {
            inner: Mutex::new(Inner {
                conn,
                ensured: HashSet::new(),
            }),
            endpoint,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert pre-serialized JSON documents in one transaction
    pub fn insert_documents(&self, target: &Target, docs: &[String]) -> Result<usize> {
        if docs.is_empty() {
            return Ok(0);
        }
        let table = qualified_name(target);
        let mut inner = self.lock();

        if !inner.ensured.contains(&table) {
            inner
                .conn
                .execute_batch(&format!(
                    "CREATE TABLE IF NOT EXISTS {table} (doc VARCHAR NOT NULL);"
                ))
                .with_context(|| format!("Failed to create table {table}"))?;
            inner.ensured.insert(table.clone());
        }

        let tx = inner
            .conn
            .transaction()
            .context("Failed to begin transaction")?;
        {
            let mut stmt = tx
                .prepare(&format!("INSERT INTO {table} (doc) VALUES (?)"))
                .with_context(|| format!("Failed to prepare insert into {table}"))?;
            for doc in docs {
                stmt.execute(duckdb::params![doc])
                    .with_context(|| format!("Failed to insert into {table}"))?;
            }
        }
        tx.commit().context("Failed to commit insert")?;
        Ok(docs.len())
    }

    /// Row count of a target table; 0 when it does not exist yet
    pub fn count(&self, target: &Target) -> Result<u64> {
        let table = qualified_name(target);
        let inner = self.lock();
        if !self.table_exists(&inner.conn, target)? {
            return Ok(0);
        }
        let n = inner
            .conn
            .query_row(&format!("SELECT count(*) FROM {table}"), [], |row| {
                row.get::<_, i64>(0)
            })
            .with_context(|| format!("Failed to count {table}"))?;
        Ok(n as u64)
    }

    /// Every stored document of a target table, in insertion order
    pub fn documents(&self, target: &Target) -> Result<Vec<String>> {
        let table = qualified_name(target);
        let inner = self.lock();
        if !self.table_exists(&inner.conn, target)? {
            return Ok(Vec::new());
        }
        let mut stmt = inner
            .conn
            .prepare(&format!("SELECT doc FROM {table} ORDER BY rowid"))
            .with_context(|| format!("Failed to query {table}"))?;
        let docs = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("Failed to read {table}"))?;
        Ok(docs)
    }

    fn table_exists(&self, conn: &Connection, target: &Target) -> Result<bool> {
        let n = conn
            .query_row(
                "SELECT count(*) FROM duckdb_tables() WHERE database_name = ? AND table_name = ?",
                duckdb::params![target.database, target.table],
                |row| row.get::<_, i64>(0),
            )
            .context("Failed to inspect catalog")?;
        Ok(n > 0)
    }
}

impl<R: Serialize + Sync> RecordSink<R> for DuckdbSink {
    fn insert(&self, target: &Target, records: &[R]) -> Result<usize, PersistFailure> {
        let docs = records
            .iter()
            .map(serde_json::to_string)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| PersistFailure::new(target, format!("serialize: {e}")))?;
        self.insert_documents(target, &docs)
            .map_err(|e| PersistFailure::new(target, format!("{e:#}")))
    }
}
