pub mod init;
pub mod load;
pub mod schema;
pub mod show;

pub use init::InitArgs;
pub use load::LoadArgs;
pub use schema::ConfigSchemaArgs;
pub use show::ShowArgs;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use syntax_loader::{load_config, LoaderConfig};

/// Options shared by every command that touches the store.
#[derive(Args, Clone, Debug)]
pub struct StoreArgs {
    /// Loader config file (TOML)
    #[arg(long, env = "SYNTAX_CONFIG")]
    pub config: Option<PathBuf>,
    /// SQLite database path; overrides the config file
    #[arg(long, env = "SYNTAX_STORE_PATH")]
    pub db: Option<PathBuf>,
}

impl StoreArgs {
    pub fn resolve(&self) -> Result<LoaderConfig> {
        let mut cfg = match &self.config {
            Some(path) => load_config(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => LoaderConfig::default(),
        };
        if let Some(db) = &self.db {
            cfg.store.path = db.clone();
        }
        tracing::debug!(
            store = %cfg.store.path.display(),
            create_tables = cfg.store.create_tables,
            "resolved loader config"
        );
        Ok(cfg)
    }
}
