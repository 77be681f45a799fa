use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use clap::Args;
use syntax_loader::{Loader, RecordKind, RunSummary};

use super::StoreArgs;

/// Exit status when `--strict` is set and some records were not stored.
pub const EXIT_PARTIAL: i32 = 2;

/// What a `load` invocation covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadTarget {
    Kind(RecordKind),
    /// Tokens, returns, then definitions; one run each
    All,
}

impl LoadTarget {
    fn kinds(self) -> Vec<RecordKind> {
        match self {
            LoadTarget::Kind(kind) => vec![kind],
            LoadTarget::All => RecordKind::ALL.to_vec(),
        }
    }
}

impl FromStr for LoadTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(LoadTarget::All)
        } else {
            s.parse().map(LoadTarget::Kind)
        }
    }
}

#[derive(Args, Clone, Debug)]
pub struct LoadArgs {
    /// Record kind to load: tokens, returns, definitions, or all
    #[arg(value_name = "KIND", value_parser = LoadTarget::from_str)]
    pub target: LoadTarget,
    #[command(flatten)]
    pub store: StoreArgs,
    /// Source document; only valid with a single record kind
    #[arg(long)]
    pub source: Option<PathBuf>,
    /// Create missing tables before loading
    #[arg(long)]
    pub init: bool,
    /// Exit with status 2 when any record failed to store
    #[arg(long)]
    pub strict: bool,
    /// Print run summaries as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: &LoadArgs) -> Result<i32> {
    let kinds = args.target.kinds();
    if args.source.is_some() && kinds.len() != 1 {
        bail!("--source requires a single record kind");
    }

    let mut config = args.store.resolve()?;
    if args.init {
        config.store.create_tables = true;
    }
    if let Some(source) = &args.source {
        *config.source_mut(kinds[0]) = source.clone();
    }

    let loader = Loader::new(config);
    let mut summaries = Vec::with_capacity(kinds.len());
    for kind in kinds {
        let summary = loader
            .run(kind)
            .with_context(|| format!("failed to load {kind} records"))?;
        summaries.push(summary);
    }

    if args.json {
        println!("{}", serde_json::to_string(&summaries)?);
    } else {
        for summary in &summaries {
            print_summary(summary);
        }
    }

    let partial = summaries.iter().any(|s| !s.is_clean());
    Ok(if args.strict && partial { EXIT_PARTIAL } else { 0 })
}

fn print_summary(summary: &RunSummary) {
    println!(
        "Loaded {}/{} {} records into {} from {}",
        summary.succeeded,
        summary.attempted,
        summary.kind,
        summary.table,
        summary.source.display()
    );
    for failure in &summary.failed {
        println!("  failed: {failure}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_accepts_kind_names_and_all() {
        assert_eq!(
            "returns".parse::<LoadTarget>().unwrap(),
            LoadTarget::Kind(RecordKind::Return)
        );
        assert_eq!(
            "token".parse::<LoadTarget>().unwrap(),
            LoadTarget::Kind(RecordKind::Token)
        );
        assert_eq!("ALL".parse::<LoadTarget>().unwrap(), LoadTarget::All);
        assert_eq!(LoadTarget::All.kinds(), RecordKind::ALL.to_vec());
        assert!("widgets".parse::<LoadTarget>().is_err());
    }
}
