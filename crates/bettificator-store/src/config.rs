//! Database connection settings

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use bettificator_core::ConfigError;

/// Storage backend behind the DuckDB engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DatabaseKind {
    /// Local `{dir}/{name}.duckdb` file
    #[default]
    Duckdb,
    /// Remote PostgreSQL database attached through DuckDB's postgres extension
    Postgres,
}

impl FromStr for DatabaseKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, ConfigError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "duckdb" => Ok(Self::Duckdb),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            other => Err(ConfigError::UnknownDatabaseKind(other.to_string())),
        }
    }
}

impl fmt::Display for DatabaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Duckdb => "duckdb",
            Self::Postgres => "postgres",
        })
    }
}

/// Everything needed to open the sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub kind: DatabaseKind,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    /// Database name; also the catalog records are addressed to
    pub name: String,
    /// Directory holding local database files
    pub dir: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            kind: DatabaseKind::Duckdb,
            host: "localhost".to_string(),
            port: 5432,
            user: "admin".to_string(),
            password: None,
            name: "test".to_string(),
            dir: PathBuf::from("./data"),
        }
    }
}

impl DatabaseConfig {
    /// Path of the local database file
    pub fn file_path(&self) -> PathBuf {
        self.dir.join(format!("{}.duckdb", self.name))
    }

    /// libpq connection string for the postgres backend
    pub fn postgres_dsn(&self) -> String {
        let mut dsn = format!(
            "host={} port={} user={} dbname={}",
            self.host, self.port, self.user, self.name
        );
        if let Some(password) = &self.password {
            dsn.push_str(&format!(" password={password}"));
        }
        dsn
    }

    /// Where records go, for log lines (no credentials)
    pub fn endpoint(&self) -> String {
        match self.kind {
            DatabaseKind::Duckdb => self.file_path().display().to_string(),
            DatabaseKind::Postgres => {
                format!("postgres://{}@{}:{}/{}", self.user, self.host, self.port, self.name)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_from_str() {
        assert_eq!("duckdb".parse::<DatabaseKind>(), Ok(DatabaseKind::Duckdb));
        assert_eq!("PostgreSQL".parse::<DatabaseKind>(), Ok(DatabaseKind::Postgres));
        assert!(matches!(
            "rethinkdb".parse::<DatabaseKind>(),
            Err(ConfigError::UnknownDatabaseKind(k)) if k == "rethinkdb"
        ));
    }

    #[test]
    fn file_path_uses_name() {
        let config = DatabaseConfig {
            name: "bets".into(),
            dir: PathBuf::from("/var/lib/bettificator"),
            ..Default::default()
        };
        assert_eq!(config.file_path(), PathBuf::from("/var/lib/bettificator/bets.duckdb"));
    }

    #[test]
    fn dsn_includes_password_only_when_set() {
        let mut config = DatabaseConfig::default();
        assert_eq!(config.postgres_dsn(), "host=localhost port=5432 user=admin dbname=test");
        config.password = Some("s3cret".into());
        assert!(config.postgres_dsn().ends_with(" password=s3cret"));
    }

    #[test]
    fn endpoint_hides_password() {
        let config = DatabaseConfig {
            kind: DatabaseKind::Postgres,
            password: Some("s3cret".into()),
            ..Default::default()
        };
        assert_eq!(config.endpoint(), "postgres://admin@localhost:5432/test");
    }
}
