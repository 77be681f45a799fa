use anyhow::{Context, Result};
use clap::Args;
use syntax_loader::{RecordKind, Store};

use super::StoreArgs;

#[derive(Args, Clone, Debug)]
pub struct InitArgs {
    #[command(flatten)]
    pub store: StoreArgs,
}

/// Create any missing token, return, and definition tables.
pub fn run(args: &InitArgs) -> Result<()> {
    let config = args.store.resolve()?;
    let store = Store::open(&config.store)
        .with_context(|| format!("failed to open store at {}", config.store.path.display()))?;
    let mut created = Vec::new();
    for kind in RecordKind::ALL {
        let table = config.table(kind);
        store
            .create_table(kind, table)
            .with_context(|| format!("failed to create table {table}"))?;
        created.push(table.to_string());
    }
    store.close().context("failed to close store")?;
    println!(
        "Tables ready in {}: {}",
        config.store.path.display(),
        created.join(", ")
    );
    Ok(())
}
