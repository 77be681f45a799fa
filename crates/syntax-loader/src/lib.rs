//! Loads syntax records (tokens, returns, definitions) from YAML documents
//! into the syntax SQLite store.
//!
//! The pipeline is the same for every record kind: [`Document`] parses the
//! source file, [`schema::validate`] checks the grouping key and required
//! fields, [`record::transform`] shapes each record into an [`InsertRow`], and
//! [`Store::insert`] commits it in its own transaction. [`Loader`] drives one
//! run per kind from a [`LoaderConfig`].

pub mod config;
pub mod document;
pub mod error;
pub mod loader;
pub mod record;
pub mod schema;
pub mod store;

pub use config::{
    config_schema_json, load_config, parse_config, write_schema_file, LoaderConfig, SourcesConfig,
    StoreConfig, TablesConfig,
};
pub use document::Document;
pub use error::{DocumentError, LoadError, SchemaError, StorageError};
pub use loader::{load_document, Clock, Loader, RunSummary};
pub use record::{transform, InsertRow, INITIAL_COUNTER_VALUE};
pub use schema::{validate, ColumnMapper, Record, RecordKind, SchemaDescriptor};
pub use store::{InsertStatement, NamedRow, Store, TokenRow, WriteOutcome};
