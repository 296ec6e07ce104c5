//! SQLite-based run storage.
//!
//! Provides persistent storage for:
//! - Finished runs and their totals
//! - Key-value store for host state (the CLI keeps the serialized timer
//!   session here between invocations)

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::{CoreError, DatabaseError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: i64,
    pub video_identity: Option<String>,
    pub split_count: u64,
    pub total_seconds: f64,
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RunStats {
    pub total_runs: u64,
    pub total_splits: u64,
    pub best_total_seconds: Option<f64>,
}

/// SQLite database for finished runs and host state.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/frametimer/frametimer.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("frametimer.db");
        let conn = Connection::open(&path).map_err(|source| DatabaseError::OpenFailed {
            path,
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// In-memory database for tests.
    pub fn open_memory() -> Result<Self, CoreError> {
        let conn = Connection::open_in_memory().map_err(DatabaseError::from)?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), CoreError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS runs (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    video_identity TEXT,
                    split_count INTEGER NOT NULL,
                    total_seconds REAL NOT NULL,
                    finished_at TEXT NOT NULL
                );
                CREATE TABLE IF NOT EXISTS kv (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );",
            )
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(())
    }

    /// Record a finished run.
    pub fn record_run(
        &self,
        video_identity: Option<&str>,
        split_count: usize,
        total_seconds: f64,
        finished_at: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        self.conn
            .execute(
                "INSERT INTO runs (video_identity, split_count, total_seconds, finished_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    video_identity,
                    split_count as i64,
                    total_seconds,
                    finished_at.to_rfc3339()
                ],
            )
            .map_err(DatabaseError::from)?;
        Ok(())
    }

    /// All-time statistics across recorded runs.
    pub fn stats(&self) -> Result<RunStats, CoreError> {
        let row = self
            .conn
            .query_row(
                "SELECT COUNT(*), COALESCE(SUM(split_count), 0), MIN(total_seconds)
                 FROM runs",
                [],
                |row| {
                    Ok((
                        row.get::<_, u64>(0)?,
                        row.get::<_, u64>(1)?,
                        row.get::<_, Option<f64>>(2)?,
                    ))
                },
            )
            .map_err(DatabaseError::from)?;
        Ok(RunStats {
            total_runs: row.0,
            total_splits: row.1,
            best_total_seconds: row.2,
        })
    }

    /// Most recent runs, newest first.
    pub fn recent_runs(&self, limit: usize) -> Result<Vec<RunRecord>, CoreError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, video_identity, split_count, total_seconds, finished_at
                 FROM runs ORDER BY id DESC LIMIT ?1",
            )
            .map_err(DatabaseError::from)?;
        let rows = stmt
            .query_map(params![limit as i64], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, u64>(2)?,
                    row.get::<_, f64>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })
            .map_err(DatabaseError::from)?;

        let mut records = Vec::new();
        for row in rows {
            let (id, video_identity, split_count, total_seconds, finished_at) =
                row.map_err(DatabaseError::from)?;
            let finished_at = finished_at
                .parse::<DateTime<Utc>>()
                .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
            records.push(RunRecord {
                id,
                video_identity,
                split_count,
                total_seconds,
                finished_at,
            });
        }
        Ok(records)
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, CoreError> {
        let result = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            });
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(DatabaseError::from(e).into()),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), CoreError> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
                params![key, value],
            )
            .map_err(DatabaseError::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_and_stats() {
        let db = Database::open_memory().unwrap();
        let now = Utc::now();
        db.record_run(Some("vid-a"), 4, 120.5, now).unwrap();
        db.record_run(Some("vid-a"), 4, 118.25, now).unwrap();
        db.record_run(None, 2, 300.0, now).unwrap();

        let stats = db.stats().unwrap();
        assert_eq!(stats.total_runs, 3);
        assert_eq!(stats.total_splits, 10);
        assert_eq!(stats.best_total_seconds, Some(118.25));

        let recent = db.recent_runs(2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].video_identity, None);
        assert_eq!(recent[1].split_count, 4);
    }

    #[test]
    fn empty_stats() {
        let db = Database::open_memory().unwrap();
        let stats = db.stats().unwrap();
        assert_eq!(stats.total_runs, 0);
        assert_eq!(stats.best_total_seconds, None);
    }

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("session").unwrap().is_none());
        db.kv_set("session", "{}").unwrap();
        assert_eq!(db.kv_get("session").unwrap().unwrap(), "{}");
        db.kv_set("session", "[1]").unwrap();
        assert_eq!(db.kv_get("session").unwrap().unwrap(), "[1]");
    }
}
