//! input-sync-repl: drive an input-sync engine from the terminal.
//!
//! Binds fields of an in-memory shared document to in-memory buffers and
//! reads commands from stdin: `type` plays the local user, `remote` and
//! `replace` play other clients. Every engine decision is logged.

use anyhow::Result;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use input_sync_core::SyncOptions;
use input_sync_repl::{Command, Reply, Session};

/// Field bound when neither `--key` nor `INPUT_SYNC_KEY` is given.
const DEFAULT_KEY: &str = "valueA";

#[derive(Parser, Debug)]
#[command(name = "input-sync-repl")]
#[command(about = "Sync a text buffer with a shared document field, interactively")]
struct Args {
    /// Document field to bind; repeat to bind several fields of one document
    /// (falls back to INPUT_SYNC_KEY, then valueA)
    #[arg(short, long = "key")]
    keys: Vec<String>,

    /// Initial value of every bound field
    #[arg(short, long, default_value = "")]
    initial: String,

    /// Fixed source marker for local ops (INPUT_SYNC_SOURCE, else generated)
    #[arg(long)]
    source: Option<String>,

    /// Enable verbose logging
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging - respects RUST_LOG env var, defaults to info (or debug with --verbose)
    let default_filter = if args.verbose {
        "debug,input_sync_core=debug"
    } else {
        "info,input_sync_core=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let initial = input_sync_repl::command::unescape(&args.initial);
    let mut session = Session::new(bindings(args.keys, args.source), &initial)?;
    for sync in session.bindings() {
        info!("Bound field {} as {}", sync.key(), sync.source());
    }
    info!("Type `help` for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    debug!("stdin closed");
                    break;
                };

                let command = match Command::parse(&line) {
                    Ok(Some(command)) => command,
                    Ok(None) => continue,
                    Err(e) => {
                        warn!("{}", e);
                        continue;
                    }
                };

                debug!("Executing {}", command);
                match session.execute(command) {
                    Reply::Output(text) => println!("{}", text),
                    Reply::Quiet => {}
                    Reply::Quit => break,
                }
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    info!("Final state:\n{}", session.describe());
    Ok(())
}

fn bindings(keys: Vec<String>, source: Option<String>) -> Vec<SyncOptions> {
    let mut options = if keys.is_empty() {
        match SyncOptions::from_env() {
            Ok(options) => vec![options],
            Err(e) => {
                debug!("{}, binding {}", e, DEFAULT_KEY);
                vec![SyncOptions::new(DEFAULT_KEY)]
            }
        }
    } else {
        keys.into_iter().map(SyncOptions::new).collect()
    };

    if let Some(source) = source {
        for option in &mut options {
            option.source = Some(source.as_str().into());
        }
    }
    options
}
