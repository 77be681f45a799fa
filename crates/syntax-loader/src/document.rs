//! YAML source documents.

use std::{fs, path::Path};

use serde_yaml::Value;

use crate::error::DocumentError;

/// Parsed source document: a tree of nested mappings and sequences.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    root: Value,
}

impl Document {
    /// Parse a document from a string. Blank input yields an empty document.
    pub fn parse(input: &str) -> Result<Self, serde_yaml::Error> {
        if input.trim().is_empty() {
            return Ok(Self { root: Value::Null });
        }
        let root = serde_yaml::from_str::<Value>(input)?;
        Ok(Self { root })
    }

    /// Read and parse the document at `path`. A parse failure is an error,
    /// never an empty document.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw).map_err(|source| DocumentError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Look up a top-level key. Returns `None` when the root is not a mapping.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match &self.root {
            Value::Mapping(map) => map.get(key),
            _ => None,
        }
    }

    pub fn root(&self) -> &Value {
        &self.root
    }
}

impl From<Value> for Document {
    fn from(root: Value) -> Self {
        Self { root }
    }
}
