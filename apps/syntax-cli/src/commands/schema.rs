use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use syntax_loader::{config_schema_json, write_schema_file};

#[derive(Args, Clone, Debug)]
pub struct ConfigSchemaArgs {
    /// Write the schema to this file instead of stdout
    #[arg(long)]
    pub out: Option<PathBuf>,
}

pub fn run(args: &ConfigSchemaArgs) -> Result<()> {
    match &args.out {
        Some(path) => {
            write_schema_file(path)
                .with_context(|| format!("failed to write schema to {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
        None => {
            let schema = config_schema_json();
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
    }
    Ok(())
}
