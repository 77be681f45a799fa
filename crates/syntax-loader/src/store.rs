//! SQLite persistence for syntax records.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params_from_iter, Connection};
use serde::Serialize;

use crate::config::StoreConfig;
use crate::error::StorageError;
use crate::record::InsertRow;
use crate::schema::{RecordKind, SchemaDescriptor};

/// Store-assigned id on success, or the captured failure.
pub type WriteOutcome = Result<i64, StorageError>;

/// Prepared `INSERT` text for one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertStatement {
    table: String,
    sql: String,
}

impl InsertStatement {
    pub fn new(table: &str, content_columns: &[&str]) -> Self {
        let mut columns = Vec::with_capacity(content_columns.len() + 3);
        columns.push("id".to_string());
        columns.extend(content_columns.iter().map(|c| quote_ident(c)));
        columns.push("created".to_string());
        columns.push("modified".to_string());
        let placeholders = (1..=columns.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(",");
        let sql = format!(
            "INSERT INTO {}({}) VALUES({})",
            quote_ident(table),
            columns.join(","),
            placeholders
        );
        Self {
            table: table.to_string(),
            sql,
        }
    }

    pub fn for_descriptor(descriptor: &SchemaDescriptor) -> Self {
        Self::new(&descriptor.table, descriptor.content_columns)
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }
}

/// A stored token row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenRow {
    pub id: i64,
    pub repr: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub data: Option<String>,
    pub size: i64,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

/// A stored return or definition row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedRow {
    pub id: i64,
    pub name: String,
    pub value: i64,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

/// Owns the connection for one loader run. Dropping the store closes it.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(config: &StoreConfig) -> rusqlite::Result<Self> {
        Self::open_path(&config.path, Duration::from_millis(config.busy_timeout_ms))
    }

    pub fn open_path(path: &Path, busy_timeout: Duration) -> rusqlite::Result<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(busy_timeout)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> rusqlite::Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    /// Create the table for `kind` under `table` when it does not exist yet.
    /// Existing tables are left untouched.
    pub fn create_table(&self, kind: RecordKind, table: &str) -> rusqlite::Result<()> {
        let columns = match kind {
            RecordKind::Token => {
                "repr TEXT NOT NULL, type TEXT NOT NULL, data TEXT, size INTEGER NOT NULL"
            }
            RecordKind::Return | RecordKind::Definition => {
                "name TEXT NOT NULL, value INTEGER NOT NULL DEFAULT 0"
            }
        };
        self.conn.execute_batch(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              {columns},
              created TEXT NOT NULL,
              modified TEXT NOT NULL
            );
            "#,
            quote_ident(table)
        ))
    }

    /// Insert one row in its own transaction. A failure is logged with its
    /// error class and source chain, rolled back, and handed back to the
    /// caller instead of propagating.
    pub fn insert(
        &mut self,
        statement: &InsertStatement,
        index: usize,
        row: &InsertRow,
    ) -> WriteOutcome {
        match self.try_insert(statement, row) {
            Ok(id) => {
                tracing::debug!(table = statement.table(), record = index, id, "row committed");
                Ok(id)
            }
            Err(err) => {
                let failure = storage_error(index, &err);
                tracing::error!(
                    table = statement.table(),
                    record = index,
                    class = %failure.class,
                    chain = ?failure.chain,
                    "SQLite error: {}",
                    failure.message
                );
                Err(failure)
            }
        }
    }

    fn try_insert(
        &mut self,
        statement: &InsertStatement,
        row: &InsertRow,
    ) -> rusqlite::Result<i64> {
        let tx = self.conn.transaction()?;
        let id = {
            let mut stmt = tx.prepare(statement.sql())?;
            stmt.execute(params_from_iter(row.params()))?;
            tx.last_insert_rowid()
        };
        tx.commit()?;
        Ok(id)
    }

    pub fn count(&self, table: &str) -> rusqlite::Result<i64> {
        self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", quote_ident(table)),
            [],
            |row| row.get(0),
        )
    }

    /// Names from a return or definition table, in insertion order.
    pub fn list_names(&self, table: &str) -> rusqlite::Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT name FROM {} ORDER BY id", quote_ident(table)))?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect()
    }

    pub fn list_named_rows(&self, table: &str) -> rusqlite::Result<Vec<NamedRow>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT id,name,value,created,modified FROM {} ORDER BY id",
            quote_ident(table)
        ))?;
        let rows = stmt.query_map([], |row| {
            Ok(NamedRow {
                id: row.get(0)?,
                name: row.get(1)?,
                value: row.get(2)?,
                created: row.get(3)?,
                modified: row.get(4)?,
            })
        })?;
        rows.collect()
    }

    pub fn list_tokens(&self, table: &str) -> rusqlite::Result<Vec<TokenRow>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT id,repr,type,data,size,created,modified FROM {} ORDER BY id",
            quote_ident(table)
        ))?;
        let rows = stmt.query_map([], |row| {
            Ok(TokenRow {
                id: row.get(0)?,
                repr: row.get(1)?,
                kind: row.get(2)?,
                data: row.get(3)?,
                size: row.get(4)?,
                created: row.get(5)?,
                modified: row.get(6)?,
            })
        })?;
        rows.collect()
    }

    /// Close explicitly so a failing close can be reported.
    pub fn close(self) -> rusqlite::Result<()> {
        self.conn.close().map_err(|(_, err)| err)
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn storage_error(index: usize, err: &rusqlite::Error) -> StorageError {
    let class = match err.sqlite_error_code() {
        Some(code) => format!("{code:?}"),
        None => error_kind(err).to_string(),
    };
    let mut chain = Vec::new();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        chain.push(cause.to_string());
        source = cause.source();
    }
    StorageError {
        index,
        class,
        message: err.to_string(),
        chain,
    }
}

fn error_kind(err: &rusqlite::Error) -> &'static str {
    match err {
        rusqlite::Error::SqliteFailure(..) => "SqliteFailure",
        rusqlite::Error::ToSqlConversionFailure(_) => "ToSqlConversionFailure",
        rusqlite::Error::InvalidParameterCount(..) => "InvalidParameterCount",
        rusqlite::Error::InvalidColumnType(..) => "InvalidColumnType",
        _ => "Other",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rusqlite::types::Value as SqlValue;

    fn named_row(name: SqlValue) -> InsertRow {
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        InsertRow {
            id: None,
            content: vec![name, SqlValue::Integer(0)],
            created: now,
            modified: now,
        }
    }

    #[test]
    fn insert_statement_quotes_table_and_numbers_placeholders() {
        let stmt = InsertStatement::new("return", &["name", "value"]);
        assert_eq!(
            stmt.sql(),
            r#"INSERT INTO "return"(id,"name","value",created,modified) VALUES(?1,?2,?3,?4,?5)"#
        );
    }

    #[test]
    fn insert_assigns_ids_and_persists_timestamps() {
        let mut store = Store::open_in_memory().unwrap();
        store.create_table(RecordKind::Return, "return").unwrap();
        let stmt = InsertStatement::new("return", &["name", "value"]);

        let first = store
            .insert(&stmt, 0, &named_row(SqlValue::Text("EXIT_OK".into())))
            .unwrap();
        let second = store
            .insert(&stmt, 1, &named_row(SqlValue::Text("EXIT_FAIL".into())))
            .unwrap();
        assert!(second > first);

        let rows = store.list_named_rows("return").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "EXIT_OK");
        assert_eq!(rows[0].created, rows[0].modified);
        assert_eq!(
            store.list_names("return").unwrap(),
            vec!["EXIT_OK".to_string(), "EXIT_FAIL".to_string()]
        );
    }

    #[test]
    fn constraint_failure_is_captured_and_rolled_back() {
        let mut store = Store::open_in_memory().unwrap();
        store.create_table(RecordKind::Definition, "definition").unwrap();
        let stmt = InsertStatement::new("definition", &["name", "value"]);

        let err = store.insert(&stmt, 3, &named_row(SqlValue::Null)).unwrap_err();
        assert_eq!(err.index, 3);
        assert_eq!(err.class, "ConstraintViolation");
        assert!(err.message.contains("NOT NULL"), "{}", err.message);
        assert_eq!(store.count("definition").unwrap(), 0);

        // The connection stays usable after a failed record.
        store
            .insert(&stmt, 4, &named_row(SqlValue::Text("DEF".into())))
            .unwrap();
        assert_eq!(store.count("definition").unwrap(), 1);
    }

    #[test]
    fn missing_table_is_a_storage_error() {
        let mut store = Store::open_in_memory().unwrap();
        let stmt = InsertStatement::new("token", &["repr", "type", "data", "size"]);
        let now = Utc::now();
        let row = InsertRow {
            id: None,
            content: vec![SqlValue::Null; 4],
            created: now,
            modified: now,
        };
        let err = store.insert(&stmt, 0, &row).unwrap_err();
        assert!(err.message.contains("no such table"), "{}", err.message);
    }

    #[test]
    fn create_table_is_idempotent() {
        let store = Store::open_in_memory().unwrap();
        store.create_table(RecordKind::Token, "token").unwrap();
        store.create_table(RecordKind::Token, "token").unwrap();
        assert_eq!(store.count("token").unwrap(), 0);
        store.close().unwrap();
    }
}
