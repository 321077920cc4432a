//! SQLite record store.
//!
//! Schemas (one table per extraction target, name chosen by the caller):
//! - generic: id, code, description, raw_columns (JSON array of cells)
//! - SEW:     id, fault_code, suberror_code, description
//!
//! Rows are only ever appended; nothing de-duplicates repeated runs.

use crate::error::FaultbookError;
use crate::model::{ErrorCodeRecord, ParsingMode, Record, SewErrorCodeRecord};
use regex::Regex;
use rusqlite::{params, params_from_iter, Connection};
use serde::Serialize;
use std::path::Path;
use std::sync::LazyLock;

/// Table used by the SEW lookup when no other table is named.
pub const SEW_TABLE: &str = "sew_error_codes";

const MAX_TABLE_NAME_LEN: usize = 64;

static TABLE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// SQL keywords that cannot be used as a bare table name.
const RESERVED_NAMES: &[&str] = &[
    "abort", "add", "all", "alter", "and", "as", "begin", "by", "case", "check", "column",
    "commit", "constraint", "create", "cross", "default", "delete", "distinct", "drop", "else",
    "end", "except", "exists", "foreign", "from", "group", "having", "in", "index", "insert",
    "intersect", "into", "is", "join", "key", "limit", "not", "null", "on", "or", "order",
    "pragma", "primary", "references", "replace", "rollback", "select", "set", "table",
    "transaction", "trigger", "union", "unique", "update", "using", "vacuum", "values", "view",
    "where", "with",
];

/// Check a table name against the identifier allow-list.
///
/// Letters, digits and underscores only, not starting with a digit, and not
/// an SQL keyword or an SQLite internal (`sqlite_*`) name.
pub fn validate_table_name(name: &str) -> Result<(), FaultbookError> {
    let invalid = |reason: &str| FaultbookError::InvalidTableName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("name is empty"));
    }
    if name.len() > MAX_TABLE_NAME_LEN {
        return Err(invalid("name is longer than 64 characters"));
    }
    if !TABLE_NAME.is_match(name) {
        return Err(invalid(
            "only letters, digits and underscores are allowed, and it must not start with a digit",
        ));
    }

    let lower = name.to_ascii_lowercase();
    if lower.starts_with("sqlite_") {
        return Err(invalid("names starting with 'sqlite_' are reserved"));
    }
    if RESERVED_NAMES.contains(&lower.as_str()) {
        return Err(invalid("name is a reserved SQL keyword"));
    }

    Ok(())
}

fn expected_columns(mode: ParsingMode) -> &'static [&'static str] {
    match mode {
        ParsingMode::Generic => &["id", "code", "description", "raw_columns"],
        ParsingMode::Sew => &["id", "fault_code", "suberror_code", "description"],
    }
}

/// Only call with a name that passed `validate_table_name`.
fn create_table_sql(table: &str, mode: ParsingMode) -> String {
    match mode {
        ParsingMode::Generic => format!(
            r#"CREATE TABLE IF NOT EXISTS "{table}" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                code TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                raw_columns TEXT NOT NULL DEFAULT '[]'
            )"#
        ),
        ParsingMode::Sew => format!(
            r#"CREATE TABLE IF NOT EXISTS "{table}" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                fault_code TEXT NOT NULL,
                suberror_code TEXT NOT NULL DEFAULT '',
                description TEXT NOT NULL DEFAULT ''
            )"#
        ),
    }
}

fn insert_sql(table: &str, mode: ParsingMode) -> String {
    match mode {
        ParsingMode::Generic => format!(
            r#"INSERT INTO "{table}" (code, description, raw_columns) VALUES (?1, ?2, ?3)"#
        ),
        ParsingMode::Sew => format!(
            r#"INSERT INTO "{table}" (fault_code, suberror_code, description) VALUES (?1, ?2, ?3)"#
        ),
    }
}

/// A generic error code read back from the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredErrorCode {
    pub id: i64,
    pub code: String,
    pub description: String,
    pub raw_columns: Vec<String>,
}

/// An SEW fault read back from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredSewRecord {
    pub id: i64,
    pub fault_code: String,
    pub suberror_code: String,
    pub description: String,
}

/// Lookup criteria for SEW tables. Each non-empty field is a substring
/// match; fields are combined with AND.
#[derive(Debug, Clone, Default)]
pub struct SewQuery {
    pub fault_code: Option<String>,
    pub suberror_code: Option<String>,
    pub description: Option<String>,
}

/// Lookup criteria for generic tables.
#[derive(Debug, Clone, Default)]
pub struct CodeQuery {
    pub code: Option<String>,
    pub description: Option<String>,
}

/// Wrapped description text continuing a row stored from an earlier page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptionTail {
    pub row_id: i64,
    pub text: String,
}

/// What one page write did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageWrite {
    pub inserted: usize,
    /// Row id of the last inserted record, if any.
    pub last_row_id: Option<i64>,
}

/// Connection to the local record store.
///
/// Owns the connection; dropping the store closes it.
pub struct RecordStore {
    conn: Connection,
}

impl RecordStore {
    /// Open or create the store at path.
    pub fn open(path: &Path) -> Result<Self, FaultbookError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        tracing::debug!(path = %path.display(), "opened record store");
        Ok(RecordStore { conn })
    }

    pub fn open_in_memory() -> Result<Self, FaultbookError> {
        Ok(RecordStore {
            conn: Connection::open_in_memory()?,
        })
    }

    /// Create the table for `mode` if it does not exist, and check that an
    /// existing table has the matching columns.
    pub fn prepare_table(&self, table: &str, mode: ParsingMode) -> Result<(), FaultbookError> {
        validate_table_name(table)?;
        self.conn.execute_batch(&create_table_sql(table, mode))?;

        self.check_columns(table, mode)
    }

    /// Insert records into `table` in a single transaction.
    ///
    /// The table is created on first use. Either every record is stored or
    /// none is.
    pub fn store(&mut self, records: &[Record], table: &str) -> Result<usize, FaultbookError> {
        Ok(self.store_page(records, table, None)?.inserted)
    }

    /// Write one page: extend a row stored earlier with `tail`, then insert
    /// `records`. Both happen in one transaction.
    pub fn store_page(
        &mut self,
        records: &[Record],
        table: &str,
        tail: Option<&DescriptionTail>,
    ) -> Result<PageWrite, FaultbookError> {
        validate_table_name(table)?;
        if records.is_empty() && tail.is_none() {
            return Ok(PageWrite::default());
        }
        let mode = records.first().map(Record::mode);
        if let Some(mode) = mode {
            self.prepare_table(table, mode)?;
        }

        // Dropping the transaction on an early return rolls it back.
        let tx = self.conn.transaction()?;
        if let Some(tail) = tail {
            let updated = tx.execute(
                &format!(
                    r#"UPDATE "{table}" SET description = CASE WHEN description = '' THEN ?1 ELSE description || ' ' || ?1 END WHERE id = ?2"#
                ),
                params![tail.text, tail.row_id],
            )?;
            if updated == 0 {
                tracing::warn!(table, row_id = tail.row_id, "row to extend no longer exists");
            }
        }

        let mut last_row_id = None;
        if let Some(mode) = mode {
            let mut insert = tx.prepare_cached(&insert_sql(table, mode))?;
            for record in records {
                let row_id = match record {
                    Record::Generic(ErrorCodeRecord {
                        code,
                        description,
                        raw_columns,
                        ..
                    }) if mode == ParsingMode::Generic => {
                        let raw = serde_json::to_string(raw_columns)?;
                        insert.insert(params![code, description, raw])?
                    }
                    Record::Sew(SewErrorCodeRecord {
                        fault_code,
                        suberror_code,
                        description,
                    }) if mode == ParsingMode::Sew => {
                        insert.insert(params![fault_code, suberror_code, description])?
                    }
                    other => {
                        return Err(FaultbookError::SchemaMismatch {
                            table: table.to_string(),
                            mode: other.mode(),
                        });
                    }
                };
                last_row_id = Some(row_id);
            }
        }
        tx.commit()?;

        tracing::debug!(
            table,
            inserted = records.len(),
            extended = tail.is_some(),
            "stored page"
        );
        Ok(PageWrite {
            inserted: records.len(),
            last_row_id,
        })
    }

    /// Number of rows in `table` (0 when it does not exist).
    pub fn count_rows(&self, table: &str) -> Result<usize, FaultbookError> {
        validate_table_name(table)?;
        if !self.table_exists(table)? {
            return Ok(0);
        }
        let count: i64 =
            self.conn
                .query_row(&format!(r#"SELECT COUNT(*) FROM "{table}""#), [], |row| {
                    row.get(0)
                })?;
        Ok(count as usize)
    }

    /// Search an SEW table. A query without criteria matches nothing.
    pub fn search_sew(
        &self,
        table: &str,
        query: &SewQuery,
    ) -> Result<Vec<StoredSewRecord>, FaultbookError> {
        validate_table_name(table)?;
        let criteria = [
            ("fault_code", query.fault_code.as_deref()),
            ("suberror_code", query.suberror_code.as_deref()),
            ("description", query.description.as_deref()),
        ];
        let Some((clause, values)) = like_clause(&criteria) else {
            return Ok(Vec::new());
        };
        if !self.table_exists(table)? {
            tracing::warn!(table, "search on missing table");
            return Ok(Vec::new());
        }
        self.check_columns(table, ParsingMode::Sew)?;

        let sql = format!(
            r#"SELECT id, fault_code, suberror_code, description FROM "{table}" WHERE {clause} ORDER BY id"#
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), |row| {
            Ok(StoredSewRecord {
                id: row.get(0)?,
                fault_code: row.get(1)?,
                suberror_code: row.get(2)?,
                description: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Search a generic error-code table. A query without criteria matches
    /// nothing.
    pub fn search_generic(
        &self,
        table: &str,
        query: &CodeQuery,
    ) -> Result<Vec<StoredErrorCode>, FaultbookError> {
        validate_table_name(table)?;
        let criteria = [
            ("code", query.code.as_deref()),
            ("description", query.description.as_deref()),
        ];
        let Some((clause, values)) = like_clause(&criteria) else {
            return Ok(Vec::new());
        };
        if !self.table_exists(table)? {
            tracing::warn!(table, "search on missing table");
            return Ok(Vec::new());
        }
        self.check_columns(table, ParsingMode::Generic)?;

        let sql = format!(
            r#"SELECT id, code, description, raw_columns FROM "{table}" WHERE {clause} ORDER BY id"#
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (id, code, description, raw) = row?;
            out.push(StoredErrorCode {
                id,
                code,
                description,
                raw_columns: serde_json::from_str(&raw)?,
            });
        }
        Ok(out)
    }

    fn table_exists(&self, table: &str) -> Result<bool, FaultbookError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![table],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn check_columns(&self, table: &str, mode: ParsingMode) -> Result<(), FaultbookError> {
        if self.table_columns(table)? != expected_columns(mode) {
            return Err(FaultbookError::SchemaMismatch {
                table: table.to_string(),
                mode,
            });
        }
        Ok(())
    }

    fn table_columns(&self, table: &str) -> Result<Vec<String>, FaultbookError> {
        let mut stmt = self
            .conn
            .prepare(&format!(r#"PRAGMA table_info("{table}")"#))?;
        let names = stmt.query_map([], |row| row.get::<_, String>(1))?;
        Ok(names.collect::<Result<Vec<_>, _>>()?)
    }
}

/// Build `col LIKE ? ESCAPE '\' AND ...` for the non-empty criteria.
fn like_clause(criteria: &[(&str, Option<&str>)]) -> Option<(String, Vec<String>)> {
    let mut conditions = Vec::new();
    let mut values = Vec::new();
    for (column, value) in criteria {
        let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            continue;
        };
        conditions.push(format!(r"{column} LIKE ? ESCAPE '\'"));
        values.push(format!("%{}%", escape_like(value)));
    }
    if conditions.is_empty() {
        None
    } else {
        Some((conditions.join(" AND "), values))
    }
}

fn escape_like(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
