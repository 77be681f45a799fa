use std::str::FromStr;

use anyhow::{bail, Context, Result};
use clap::Args;
use syntax_loader::{RecordKind, Store};

use super::StoreArgs;

#[derive(Args, Clone, Debug)]
pub struct ShowArgs {
    /// Record kind to print: tokens, returns, or definitions
    #[arg(value_name = "KIND", value_parser = RecordKind::from_str)]
    pub kind: RecordKind,
    #[command(flatten)]
    pub store: StoreArgs,
    /// Print full rows as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: &ShowArgs) -> Result<()> {
    let config = args.store.resolve()?;
    if !config.store.path.exists() {
        bail!("store not found at {}", config.store.path.display());
    }
    let store = Store::open(&config.store)
        .with_context(|| format!("failed to open store at {}", config.store.path.display()))?;
    let kind = args.kind;
    let table = config.table(kind);

    match kind {
        RecordKind::Token => {
            let rows = store
                .list_tokens(table)
                .with_context(|| format!("failed to read {table}"))?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                for row in rows {
                    println!(
                        "{}\t{}\t{}\t{}",
                        row.repr,
                        row.kind,
                        row.data.as_deref().unwrap_or(""),
                        row.size
                    );
                }
            }
        }
        RecordKind::Return | RecordKind::Definition => {
            if args.json {
                let rows = store
                    .list_named_rows(table)
                    .with_context(|| format!("failed to read {table}"))?;
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                let names = store
                    .list_names(table)
                    .with_context(|| format!("failed to read {table}"))?;
                for name in names {
                    println!("{name}");
                }
            }
        }
    }
    Ok(())
}
