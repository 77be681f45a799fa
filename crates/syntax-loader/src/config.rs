use std::path::{Path, PathBuf};

use anyhow::Result;
use jsonschema::{validator_for, Validator};
use once_cell::sync::Lazy;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::schema::{RecordKind, SchemaDescriptor};

/// Loader configuration. Every field has a default, so an empty file (or no
/// file at all) targets `tmp/db/syntax.sqlite3` and the `etc/*.yaml` sources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct LoaderConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub tables: TablesConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// SQLite database file.
    #[serde(default = "StoreConfig::default_path")]
    pub path: PathBuf,
    /// Create missing tables before loading.
    #[serde(default)]
    pub create_tables: bool,
    /// How long to wait on a locked database before failing an insert.
    #[serde(default = "StoreConfig::default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl StoreConfig {
    const DEFAULT_PATH: &'static str = "tmp/db/syntax.sqlite3";
    const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

    fn default_path() -> PathBuf {
        PathBuf::from(Self::DEFAULT_PATH)
    }

    const fn default_busy_timeout_ms() -> u64 {
        Self::DEFAULT_BUSY_TIMEOUT_MS
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: Self::default_path(),
            create_tables: false,
            busy_timeout_ms: Self::default_busy_timeout_ms(),
        }
    }
}

/// Source document per record kind.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SourcesConfig {
    #[serde(default = "SourcesConfig::default_tokens")]
    pub tokens: PathBuf,
    #[serde(default = "SourcesConfig::default_returns")]
    pub returns: PathBuf,
    #[serde(default = "SourcesConfig::default_definitions")]
    pub definitions: PathBuf,
}

impl SourcesConfig {
    fn default_tokens() -> PathBuf {
        PathBuf::from("etc/tokens.yaml")
    }

    fn default_returns() -> PathBuf {
        PathBuf::from("etc/returns.yaml")
    }

    fn default_definitions() -> PathBuf {
        PathBuf::from("etc/definitions.yaml")
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            tokens: Self::default_tokens(),
            returns: Self::default_returns(),
            definitions: Self::default_definitions(),
        }
    }
}

/// Target table per record kind.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct TablesConfig {
    #[serde(default = "TablesConfig::default_tokens")]
    pub tokens: String,
    #[serde(default = "TablesConfig::default_returns")]
    pub returns: String,
    #[serde(default = "TablesConfig::default_definitions")]
    pub definitions: String,
}

impl TablesConfig {
    fn default_tokens() -> String {
        RecordKind::Token.as_str().to_string()
    }

    fn default_returns() -> String {
        RecordKind::Return.as_str().to_string()
    }

    fn default_definitions() -> String {
        RecordKind::Definition.as_str().to_string()
    }
}

impl Default for TablesConfig {
    fn default() -> Self {
        Self {
            tokens: Self::default_tokens(),
            returns: Self::default_returns(),
            definitions: Self::default_definitions(),
        }
    }
}

impl LoaderConfig {
    pub fn source(&self, kind: RecordKind) -> &Path {
        match kind {
            RecordKind::Token => &self.sources.tokens,
            RecordKind::Return => &self.sources.returns,
            RecordKind::Definition => &self.sources.definitions,
        }
    }

    pub fn source_mut(&mut self, kind: RecordKind) -> &mut PathBuf {
        match kind {
            RecordKind::Token => &mut self.sources.tokens,
            RecordKind::Return => &mut self.sources.returns,
            RecordKind::Definition => &mut self.sources.definitions,
        }
    }

    pub fn table(&self, kind: RecordKind) -> &str {
        match kind {
            RecordKind::Token => &self.tables.tokens,
            RecordKind::Return => &self.tables.returns,
            RecordKind::Definition => &self.tables.definitions,
        }
    }

    pub fn descriptor(&self, kind: RecordKind) -> SchemaDescriptor {
        SchemaDescriptor::new(kind, self.source(kind), self.table(kind))
    }
}

static CONFIG_SCHEMA: Lazy<Validator> = Lazy::new(|| {
    let schema = schemars::schema_for!(LoaderConfig);
    let schema_value = serde_json::to_value(&schema).expect("schema value");
    validator_for(&schema_value).expect("valid schema")
});

/// Returns the JSON schema describing the configuration file.
///
/// # Panics
///
/// Panics if schema generation fails; this indicates a programming error.
pub fn config_schema_json() -> serde_json::Value {
    let schema = schemars::schema_for!(LoaderConfig);
    serde_json::to_value(&schema).expect("schema json")
}

pub fn write_schema_file<P: AsRef<Path>>(path: P) -> std::io::Result<()> {
    let schema_json = config_schema_json();
    std::fs::write(path, serde_json::to_string_pretty(&schema_json)?)
}

pub fn parse_config(content: &str) -> Result<LoaderConfig> {
    let raw: toml::Value = toml::from_str(content)?;
    let json_value = serde_json::to_value(&raw)?;
    let validation_errors: Vec<_> = CONFIG_SCHEMA
        .iter_errors(&json_value)
        .map(|e| e.to_string())
        .collect();
    if !validation_errors.is_empty() {
        return Err(anyhow::anyhow!(validation_errors.join(", ")));
    }
    let cfg: LoaderConfig = toml::from_str(content)?;
    Ok(cfg)
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<LoaderConfig> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}
