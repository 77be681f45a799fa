//! The loader driver: one run per record kind.
//!
//! A run opens the store, reads and validates the whole source document, and
//! then transforms and inserts each record in order. Read and validation
//! failures end the run before the store is touched; insert failures are
//! collected in the [`RunSummary`] and the run moves on to the next record.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::LoaderConfig;
use crate::document::Document;
use crate::error::{LoadError, SchemaError, StorageError};
use crate::record::transform;
use crate::schema::{Record, RecordKind, SchemaDescriptor};
use crate::store::{InsertStatement, Store, WriteOutcome};

/// Source of the per-record timestamp.
pub type Clock = fn() -> DateTime<Utc>;

/// Outcome of one completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub kind: RecordKind,
    pub table: String,
    pub source: PathBuf,
    pub attempted: usize,
    pub succeeded: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed: Vec<StorageError>,
}

impl RunSummary {
    fn new(descriptor: &SchemaDescriptor) -> Self {
        Self {
            kind: descriptor.kind,
            table: descriptor.table.clone(),
            source: descriptor.source.clone(),
            attempted: 0,
            succeeded: 0,
            failed: Vec::new(),
        }
    }

    fn record(&mut self, outcome: WriteOutcome) {
        self.attempted += 1;
        match outcome {
            Ok(_) => self.succeeded += 1,
            Err(err) => self.failed.push(err),
        }
    }

    /// True when every attempted record was stored.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct Loader {
    config: LoaderConfig,
    clock: Clock,
}

impl Loader {
    pub fn new(config: LoaderConfig) -> Self {
        Self {
            config,
            clock: Utc::now,
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn run(&self, kind: RecordKind) -> Result<RunSummary, LoadError> {
        self.run_descriptor(&self.config.descriptor(kind))
    }

    /// Open the store, load `descriptor`'s document into it, and close it.
    /// Tables are only bootstrapped once the document has been read and
    /// validated. The connection is released on every path.
    pub fn run_descriptor(
        &self,
        descriptor: &SchemaDescriptor,
    ) -> Result<RunSummary, LoadError> {
        let store_cfg = &self.config.store;
        let mut store = Store::open(store_cfg).map_err(|source| LoadError::Open {
            path: store_cfg.path.clone(),
            source,
        })?;

        let document = Document::from_path(&descriptor.source)?;
        let records = validated_records(descriptor, &document)?;
        if store_cfg.create_tables {
            store.create_table(descriptor.kind, &descriptor.table)?;
        }
        let summary = insert_records(&mut store, descriptor, &records, self.clock);

        if let Err(err) = store.close() {
            tracing::warn!(%err, path = %store_cfg.path.display(), "failed to close store");
        }
        Ok(summary)
    }
}

/// Validate `document` and insert its records into an already open store.
pub fn load_document(
    store: &mut Store,
    descriptor: &SchemaDescriptor,
    document: &Document,
    clock: Clock,
) -> Result<RunSummary, LoadError> {
    let records = validated_records(descriptor, document)?;
    Ok(insert_records(store, descriptor, &records, clock))
}

fn validated_records(
    descriptor: &SchemaDescriptor,
    document: &Document,
) -> Result<Vec<Record>, SchemaError> {
    let records = descriptor.validate(document)?;
    tracing::debug!(
        kind = %descriptor.kind,
        records = records.len(),
        source = %descriptor.source.display(),
        "document validated"
    );
    Ok(records)
}

fn insert_records(
    store: &mut Store,
    descriptor: &SchemaDescriptor,
    records: &[Record],
    clock: Clock,
) -> RunSummary {
    let statement = InsertStatement::for_descriptor(descriptor);
    let mut summary = RunSummary::new(descriptor);
    for (index, record) in records.iter().enumerate() {
        let row = transform(record, descriptor, clock());
        summary.record(store.insert(&statement, index, &row));
    }

    tracing::info!(
        kind = %summary.kind,
        table = %summary.table,
        attempted = summary.attempted,
        succeeded = summary.succeeded,
        failed = summary.failed.len(),
        "load finished"
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_clock() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 11, 5, 8, 0, 0).unwrap()
    }

    fn store_with(kind: RecordKind) -> Store {
        let store = Store::open_in_memory().unwrap();
        store.create_table(kind, kind.as_str()).unwrap();
        store
    }

    #[test]
    fn loads_every_record() {
        let mut store = store_with(RecordKind::Definition);
        let descriptor = SchemaDescriptor::new(RecordKind::Definition, "inline", "definition");
        let document = Document::parse(
            "definitions:\n  - { name: ALPHA, value: 1 }\n  - { name: BETA, value: 2 }\n",
        )
        .unwrap();

        let summary = load_document(&mut store, &descriptor, &document, fixed_clock).unwrap();
        assert_eq!(summary.attempted, 2);
        assert_eq!(summary.succeeded, 2);
        assert!(summary.is_clean());

        let rows = store.list_named_rows("definition").unwrap();
        assert!(rows.iter().all(|r| r.value == 0 && r.created == fixed_clock()));
    }

    #[test]
    fn schema_error_writes_nothing() {
        let mut store = store_with(RecordKind::Return);
        let descriptor = SchemaDescriptor::new(RecordKind::Return, "inline", "return");
        let document =
            Document::parse("returns:\n  - { name: A, value: 1 }\n  - { name: B }\n").unwrap();

        let err = load_document(&mut store, &descriptor, &document, fixed_clock).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Schema(SchemaError::MissingField { index: 1, .. })
        ));
        assert_eq!(store.count("return").unwrap(), 0);
    }

    #[test]
    fn storage_failures_are_summarised() {
        let mut store = store_with(RecordKind::Return);
        let descriptor = SchemaDescriptor::new(RecordKind::Return, "inline", "return");
        let document = Document::parse(
            "returns:\n  - { name: A, value: 1 }\n  - { name: ~, value: 1 }\n  - { name: C, value: 1 }\n",
        )
        .unwrap();

        let summary = load_document(&mut store, &descriptor, &document, fixed_clock).unwrap();
        assert_eq!(summary.attempted, 3);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].index, 1);
        assert!(!summary.is_clean());
        assert_eq!(store.list_names("return").unwrap(), vec!["A", "C"]);
    }
}
