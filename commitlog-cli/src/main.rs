mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use commitlog_core::{CommitReader, CommitWriter, WriterOptions};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use config::{load_config, Config};

#[derive(Parser)]
#[command(name = "commitlog")]
#[command(about = "Append to and read from a shared commit log")]
#[command(version)]
struct Cli {
    /// TOML config file (defaults: $COMMITLOG_CONFIG, then ./commitlog.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Commit one message to the log
    Write {
        /// Filename for the log file
        #[arg(long)]
        fname: Option<PathBuf>,
        /// Writer identity for the message
        #[arg(long)]
        cid: Option<String>,
        /// Commit message
        #[arg(long)]
        msg: String,
    },
    /// Print every message of one writer identity
    Read {
        /// Filename for the log file
        #[arg(long)]
        fname: Option<PathBuf>,
        /// Writer identity to filter on
        #[arg(long)]
        cid: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    init_tracing(&config);

    match cli.command {
        Commands::Write { fname, cid, msg } => {
            let (fname, cid) = resolve(&config, fname, cid);
            write_message(&config, fname, &cid, &msg)
        }
        Commands::Read { fname, cid } => {
            let (fname, cid) = resolve(&config, fname, cid);
            read_messages(fname, &cid)
        }
    }
}

/// Logs go to stderr; stdout carries only record output
fn init_tracing(config: &Config) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Flags win over config values. Anything still missing is passed on as an
/// empty string so the core reports it as a configuration error.
fn resolve(config: &Config, fname: Option<PathBuf>, cid: Option<String>) -> (PathBuf, String) {
    let fname = fname.or_else(|| config.log_file.clone()).unwrap_or_default();
    let cid = cid.or_else(|| config.writer_id.clone()).unwrap_or_default();
    (fname, cid)
}

fn write_message(config: &Config, fname: PathBuf, cid: &str, msg: &str) -> Result<()> {
    let options = WriterOptions::new().sync(config.sync).writer_id(cid);
    let writer = CommitWriter::with_options(&fname, options)
        .with_context(|| format!("Failed to open log file: {}", fname.display()))?;

    let key = writer
        .commit(msg)
        .with_context(|| format!("Failed to commit to: {}", fname.display()))?;
    tracing::info!(key = %key, "committed");

    println!("Committed");
    Ok(())
}

fn read_messages(fname: PathBuf, cid: &str) -> Result<()> {
    let reader = CommitReader::open_with_writer_id(&fname, cid)
        .with_context(|| format!("Failed to open log file: {}", fname.display()))?;

    reader
        .fetch()
        .with_context(|| format!("Failed to read: {}", fname.display()))?;
    Ok(())
}
