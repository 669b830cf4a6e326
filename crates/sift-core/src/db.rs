//! Relational store with connection pooling
//!
//! The classifier keeps no state of its own; the store exists so operators
//! can check connectivity (`/db-check`). Location comes from `DATABASE_URL`
//! (`sqlite://<path>` or a bare file path).

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use tracing::{debug, info};

use crate::error::{Error, Result};

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// Environment variable naming the database location
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

/// Database wrapper with connection pooling
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    /// Path to the database file
    db_path: String,
}

impl Database {
    /// Open (creating if needed) a SQLite database at `location`
    pub fn new(location: &str) -> Result<Self> {
        let path = sqlite_path(location)?;
        let manager = SqliteConnectionManager::file(&path).with_init(|conn| {
            conn.execute_batch(
                r#"
                PRAGMA foreign_keys = ON;
                PRAGMA busy_timeout = 5000;
                "#,
            )
        });
        let pool = Pool::builder().max_size(10).build(manager)?;

        info!(path = %path, "Database pool ready");
        Ok(Self {
            pool,
            db_path: path,
        })
    }

    /// Create a throwaway database in the temp directory (for testing)
    pub fn in_memory() -> Result<Self> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!("sift_test_{}_{}.db", std::process::id(), id));

        // Remove any existing file
        let _ = std::fs::remove_file(&path);

        Self::new(&path.to_string_lossy())
    }

    /// Get the path to the database file
    pub fn path(&self) -> &str {
        &self.db_path
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    /// Run a trivial query to prove the store is reachable
    pub fn check(&self) -> Result<i64> {
        let conn = self.conn()?;
        let ok: i64 = conn.query_row("SELECT 1 AS ok", [], |row| row.get("ok"))?;
        debug!(path = %self.db_path, "Database check passed");
        Ok(ok)
    }
}

/// Resolve a `DATABASE_URL` value to a SQLite file path
fn sqlite_path(location: &str) -> Result<String> {
    let path = match location.split_once("://") {
        Some(("sqlite", rest)) => rest,
        Some((scheme, _)) => {
            return Err(Error::Config(format!(
                "Unsupported database scheme '{}': only sqlite is supported",
                scheme
            )))
        }
        None => location.strip_prefix("sqlite:").unwrap_or(location),
    };

    if path.is_empty() {
        return Err(Error::Config("Database path is empty".to_string()));
    }
    Ok(path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_path_forms() {
        assert_eq!(sqlite_path("sqlite:///tmp/a.db").unwrap(), "/tmp/a.db");
        assert_eq!(sqlite_path("sqlite://data/a.db").unwrap(), "data/a.db");
        assert_eq!(sqlite_path("sqlite:a.db").unwrap(), "a.db");
        assert_eq!(sqlite_path("/var/lib/sift.db").unwrap(), "/var/lib/sift.db");
    }

    #[test]
    fn test_unsupported_scheme_is_config_error() {
        let err = sqlite_path("postgresql://user@host/db").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(matches!(sqlite_path("sqlite://"), Err(Error::Config(_))));
    }

    #[test]
    fn test_check_returns_one() {
        let db = Database::in_memory().unwrap();
        assert_eq!(db.check().unwrap(), 1);
    }

    #[test]
    fn test_new_with_tempdir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sift.db");
        let db = Database::new(&format!("sqlite://{}", path.display())).unwrap();
        assert_eq!(db.check().unwrap(), 1);
        assert!(path.exists());
    }
}
