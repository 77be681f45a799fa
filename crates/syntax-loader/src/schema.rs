//! Record kinds, their schema descriptors, and presence validation.
//!
//! Each record kind (token, return, definition) is described by a
//! [`SchemaDescriptor`]: where its document lives, which top-level key groups
//! its records, which fields every record must carry, and how a record maps
//! onto the columns of its table. The loader is generic over descriptors.

use std::{fmt, path::PathBuf, str::FromStr};

use rusqlite::types::Value as SqlValue;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::document::Document;
use crate::error::SchemaError;
use crate::record;

/// The three kinds of records the syntax store knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Token,
    Return,
    Definition,
}

impl RecordKind {
    pub const ALL: [RecordKind; 3] = [
        RecordKind::Token,
        RecordKind::Return,
        RecordKind::Definition,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RecordKind::Token => "token",
            RecordKind::Return => "return",
            RecordKind::Definition => "definition",
        }
    }

    /// Top-level document key holding the records of this kind.
    pub fn grouping_key(self) -> &'static str {
        match self {
            RecordKind::Token => "tokens",
            RecordKind::Return => "returns",
            RecordKind::Definition => "definitions",
        }
    }

    pub fn required_fields(self) -> &'static [&'static str] {
        match self {
            RecordKind::Token => &["repr", "type", "data", "size"],
            RecordKind::Return | RecordKind::Definition => &["name", "value"],
        }
    }

    /// Content columns written between `id` and the timestamp columns.
    pub fn content_columns(self) -> &'static [&'static str] {
        match self {
            RecordKind::Token => &["repr", "type", "data", "size"],
            RecordKind::Return | RecordKind::Definition => &["name", "value"],
        }
    }

    fn column_mapper(self) -> ColumnMapper {
        match self {
            RecordKind::Token => record::token_columns,
            RecordKind::Return | RecordKind::Definition => record::named_counter_columns,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = String;

    /// Accepts both the singular kind and its plural grouping key.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "token" | "tokens" => Ok(RecordKind::Token),
            "return" | "returns" => Ok(RecordKind::Return),
            "definition" | "definitions" => Ok(RecordKind::Definition),
            other => Err(format!("unknown record kind: {other}")),
        }
    }
}

/// Maps a validated record onto the content columns of its table.
pub type ColumnMapper = fn(&Record) -> Vec<SqlValue>;

/// Everything the loader needs to know about one record kind.
#[derive(Clone)]
pub struct SchemaDescriptor {
    pub kind: RecordKind,
    pub source: PathBuf,
    pub grouping_key: &'static str,
    pub required_fields: &'static [&'static str],
    pub table: String,
    pub content_columns: &'static [&'static str],
    pub map_columns: ColumnMapper,
}

impl SchemaDescriptor {
    pub fn new(kind: RecordKind, source: impl Into<PathBuf>, table: impl Into<String>) -> Self {
        Self {
            kind,
            source: source.into(),
            grouping_key: kind.grouping_key(),
            required_fields: kind.required_fields(),
            table: table.into(),
            content_columns: kind.content_columns(),
            map_columns: kind.column_mapper(),
        }
    }

    pub fn validate(&self, document: &Document) -> Result<Vec<Record>, SchemaError> {
        validate(document, self.grouping_key, self.required_fields)
    }
}

impl fmt::Debug for SchemaDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaDescriptor")
            .field("kind", &self.kind)
            .field("source", &self.source)
            .field("grouping_key", &self.grouping_key)
            .field("required_fields", &self.required_fields)
            .field("table", &self.table)
            .field("content_columns", &self.content_columns)
            .finish_non_exhaustive()
    }
}

/// One record mapping (field name -> scalar) from a source document.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    fields: Mapping,
}

impl Record {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }
}

impl From<Mapping> for Record {
    fn from(fields: Mapping) -> Self {
        Self { fields }
    }
}

/// Confirm `grouping_key` is present and that every record carries each of
/// `required_fields`. Stops at the first offending record.
///
/// A grouping key bound to null is an empty batch.
pub fn validate(
    document: &Document,
    grouping_key: &str,
    required_fields: &[&str],
) -> Result<Vec<Record>, SchemaError> {
    let grouping = document
        .get(grouping_key)
        .ok_or_else(|| SchemaError::MissingGrouping {
            grouping_key: grouping_key.to_string(),
        })?;

    let entries = match grouping {
        Value::Null => return Ok(Vec::new()),
        Value::Sequence(entries) => entries,
        _ => {
            return Err(SchemaError::NotASequence {
                grouping_key: grouping_key.to_string(),
            })
        }
    };

    let mut records = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let Value::Mapping(fields) = entry else {
            return Err(SchemaError::NotAMapping {
                grouping_key: grouping_key.to_string(),
                index,
            });
        };
        if let Some(field) = required_fields
            .iter()
            .find(|field| !fields.contains_key(**field))
        {
            return Err(SchemaError::MissingField {
                grouping_key: grouping_key.to_string(),
                index,
                field: (*field).to_string(),
            });
        }
        records.push(Record::from(fields.clone()));
    }
    Ok(records)
}
