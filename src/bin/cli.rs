//! kvbucket CLI
//!
//! Command-line interface for inspecting and editing a kvbucket table.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use kvbucket::{Entries, Store, StoreConfig, StoreError};
use tracing_subscriber::{fmt, EnvFilter};

/// kvbucket CLI
#[derive(Parser, Debug)]
#[command(name = "kvbucket-cli")]
#[command(about = "CLI for the kvbucket embedded key-value store")]
#[command(version)]
struct Args {
    /// Database file
    #[arg(short, long)]
    db: PathBuf,

    /// Table (bucket) to operate on
    #[arg(short, long, default_value = "default")]
    table: String,

    /// How long to wait for the file lock, in milliseconds
    #[arg(short, long, default_value = "1000")]
    lock_timeout_ms: u64,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get values by key
    Get {
        /// Keys to look up
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Set key-value pairs in one transaction
    Set {
        /// Pairs as KEY=VALUE
        #[arg(required = true)]
        pairs: Vec<String>,
    },

    /// Delete keys
    Del {
        /// Keys to delete
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Print every entry of the table
    Dump,

    /// Print the number of entries in the table
    Count,

    /// Write a backup of the whole file
    Backup {
        /// Destination file
        dest: PathBuf,

        /// Skip re-reading the copy before publishing it
        #[arg(long)]
        no_verify: bool,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize tracing/logging
    let default_filter = if args.verbose { "info,kvbucket=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let config = StoreConfig::builder()
        .path(&args.db)
        .table(&args.table)
        .lock_timeout_ms(args.lock_timeout_ms)
        .verify_backups(!matches!(args.command, Commands::Backup { no_verify: true, .. }))
        .build();

    let store = match Store::open(config) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("Failed to open store: {}", e);
            return ExitCode::from(2);
        }
    };

    tracing::debug!("Using table '{}' in {}", store.table(), store.path().display());

    match run(&store, args.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::Usage(msg)) => {
            tracing::error!("{}", msg);
            ExitCode::from(2)
        }
        Err(CliError::Store(e)) => {
            tracing::error!("{} (kind: {:?})", e, e.kind());
            ExitCode::FAILURE
        }
    }
}

enum CliError {
    Usage(String),
    Store(StoreError),
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        CliError::Store(e)
    }
}

fn run(store: &Store, command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Get { keys } => print_entries(&store.get(&keys)?),
        Commands::Set { pairs } => {
            let entries = pairs
                .iter()
                .map(|pair| parse_pair(pair))
                .collect::<Result<Vec<_>, _>>()?;
            store.set(entries)?;
        }
        Commands::Del { keys } => store.delete(&keys)?,
        Commands::Dump => print_entries(&store.get_all()?),
        Commands::Count => println!("{}", store.len()?),
        Commands::Backup { dest, .. } => {
            let report = store.backup(&dest)?;
            println!(
                "backup written to {}: {} tables, {} entries, crc32 {:08x}",
                report.path.display(),
                report.tables,
                report.entries,
                report.checksum
            );
        }
    }
    Ok(())
}

/// "KEY=VALUE" → (KEY, VALUE); the value may itself contain '='
fn parse_pair(pair: &str) -> Result<(&str, &str), CliError> {
    pair.split_once('=')
        .ok_or_else(|| CliError::Usage(format!("Expected KEY=VALUE, got '{}'", pair)))
}

fn print_entries(entries: &Entries) {
    for (key, value) in entries {
        println!(
            "{}={}",
            String::from_utf8_lossy(key),
            String::from_utf8_lossy(value)
        );
    }
}
