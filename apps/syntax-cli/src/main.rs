mod commands;
mod telemetry;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{ConfigSchemaArgs, InitArgs, LoadArgs, ShowArgs};

#[derive(Parser)]
#[command(name = "syntax-cli", version, about = "Syntax store loader utilities")]
struct Cli {
    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load token, return, or definition records from YAML into the store
    Load(LoadArgs),
    /// Create missing tables in the store
    Init(InitArgs),
    /// Print stored rows for a record kind
    Show(ShowArgs),
    /// Print the JSON schema of the loader config file
    ConfigSchema(ConfigSchemaArgs),
}

fn dispatch(command: Commands) -> Result<i32> {
    match command {
        Commands::Load(args) => commands::load::run(&args),
        Commands::Init(args) => commands::init::run(&args).map(|()| 0),
        Commands::Show(args) => commands::show::run(&args).map(|()| 0),
        Commands::ConfigSchema(args) => commands::schema::run(&args).map(|()| 0),
    }
}

fn main() {
    let cli = Cli::parse();
    telemetry::init(cli.verbose);

    match dispatch(cli.command) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(1);
        }
    }
}
