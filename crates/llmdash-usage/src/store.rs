//! Read-only access to the llm log database.
//!
//! The store is owned by another tool. Every call opens its own read-only
//! connection and drops it before returning, so nothing is held between
//! requests.

use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags, OptionalExtension, params};
use tracing::debug;

use crate::error::{Result, UsageError};
use crate::models::LogRecord;

/// Table holding one row per logged response.
pub const RESPONSES_TABLE: &str = "responses";

/// Row columns read as text. Older databases use integer ids, newer ones ULIDs.
const RECORD_COLUMNS: &str = "COALESCE(CAST(id AS TEXT), ''), COALESCE(CAST(model AS TEXT), ''),
     COALESCE(CAST(datetime_utc AS TEXT), ''), COALESCE(CAST(response_json AS TEXT), '')";

/// Handle to the log database file.
#[derive(Debug, Clone)]
pub struct LogStore {
    path: PathBuf,
    marker: String,
}

impl LogStore {
    /// Create a handle. Nothing is opened until a query runs.
    pub fn new(path: impl Into<PathBuf>, marker: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            marker: marker.into(),
        }
    }

    /// Path of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Marker identifying usage-bearing responses.
    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Open a read-only connection and check the `responses` table exists.
    fn connect(&self) -> Result<Connection> {
        let conn = self.open_raw()?;

        let has_table: Option<String> = conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
                params![RESPONSES_TABLE],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| self.unavailable(e))?;

        if has_table.is_none() {
            return Err(UsageError::MissingTable {
                path: self.path.clone(),
            });
        }

        Ok(conn)
    }

    /// Open without the schema check.
    fn open_raw(&self) -> Result<Connection> {
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        Connection::open_with_flags(&self.path, flags).map_err(|e| self.unavailable(e))
    }

    fn unavailable(&self, source: rusqlite::Error) -> UsageError {
        UsageError::StoreUnavailable {
            path: self.path.clone(),
            source,
        }
    }

    /// Fetch usage-bearing rows, optionally for one model.
    ///
    /// Dates are not filtered here: stored timestamps are not comparable as text.
    pub fn usage_bearing_records(&self, model: Option<&str>) -> Result<Vec<LogRecord>> {
        let conn = self.connect()?;

        let mut sql = format!(
            "SELECT {RECORD_COLUMNS}
             FROM responses
             WHERE instr(response_json, ?1) > 0"
        );
        if model.is_some() {
            sql.push_str(" AND model = ?2");
        }
        sql.push_str(" ORDER BY id");

        let mut stmt = conn.prepare(&sql)?;
        let records = match model {
            Some(model) => stmt
                .query_map(params![self.marker, model], map_record)?
                .collect::<rusqlite::Result<Vec<_>>>()?,
            None => stmt
                .query_map(params![self.marker], map_record)?
                .collect::<rusqlite::Result<Vec<_>>>()?,
        };

        debug!(
            count = records.len(),
            model = model.unwrap_or("all"),
            "Fetched usage-bearing records"
        );
        Ok(records)
    }

    /// Distinct models among usage-bearing rows, alphabetical.
    pub fn usage_bearing_models(&self) -> Result<Vec<String>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT DISTINCT CAST(model AS TEXT) AS name FROM responses
             WHERE instr(response_json, ?1) > 0 AND model IS NOT NULL
             ORDER BY name",
        )?;
        let models = stmt
            .query_map(params![self.marker], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(models)
    }

    /// Raw timestamps of every usage-bearing row.
    pub fn usage_bearing_timestamps(&self) -> Result<Vec<String>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT CAST(datetime_utc AS TEXT) FROM responses
             WHERE instr(response_json, ?1) > 0 AND datetime_utc IS NOT NULL",
        )?;
        let timestamps = stmt
            .query_map(params![self.marker], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(timestamps)
    }

    /// Number of usage-bearing rows.
    pub fn count_usage_bearing(&self) -> Result<i64> {
        let conn = self.connect()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM responses WHERE instr(response_json, ?1) > 0",
            params![self.marker],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Textual MIN/MAX of usage-bearing timestamps, as SQLite orders them.
    pub fn raw_timestamp_range(&self) -> Result<(Option<String>, Option<String>)> {
        let conn = self.connect()?;
        let range = conn.query_row(
            "SELECT CAST(MIN(datetime_utc) AS TEXT), CAST(MAX(datetime_utc) AS TEXT) FROM responses
             WHERE instr(response_json, ?1) > 0",
            params![self.marker],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(range)
    }

    /// Names of every table in the database.
    pub fn table_names(&self) -> Result<Vec<String>> {
        let conn = self.open_raw()?;
        let mut stmt =
            conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(names)
    }

    /// First few raw timestamps in the table, usage-bearing or not.
    pub fn sample_timestamps(&self, limit: usize) -> Result<Vec<String>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT CAST(datetime_utc AS TEXT) FROM responses
             WHERE datetime_utc IS NOT NULL ORDER BY id LIMIT ?1",
        )?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let samples = stmt
            .query_map(params![limit], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(samples)
    }

    /// First usage-bearing row, if any.
    pub fn first_usage_bearing(&self) -> Result<Option<LogRecord>> {
        let conn = self.connect()?;
        let record = conn
            .query_row(
                &format!(
                    "SELECT {RECORD_COLUMNS} FROM responses
                     WHERE instr(response_json, ?1) > 0 ORDER BY id LIMIT 1"
                ),
                params![self.marker],
                map_record,
            )
            .optional()?;
        Ok(record)
    }
}

fn map_record(row: &rusqlite::Row) -> rusqlite::Result<LogRecord> {
    Ok(LogRecord {
        id: row.get(0)?,
        model: row.get(1)?,
        timestamp_raw: row.get(2)?,
        response_json: row.get(3)?,
    })
}
