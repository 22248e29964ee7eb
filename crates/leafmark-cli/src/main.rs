//! leafmark CLI
//!
//! Command-line interface for leafmark - recent documents and page bookmarks.

use std::fs::OpenOptions;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use leafmark_core::{Config, StorageError, Store};

mod commands;
mod output;
mod prompt;
mod surface;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "leafmark")]
#[command(about = "leafmark - Recent documents and page bookmarks")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open a document and remember it
    Open {
        /// Path or file:// URI of the document
        path: String,
    },
    /// Recently opened documents
    Recent {
        #[command(subcommand)]
        command: Option<RecentCommands>,
    },
    /// Manage bookmarks
    Bookmark {
        #[command(subcommand)]
        command: BookmarkCommands,
    },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
enum RecentCommands {
    /// List recent documents, most recent first
    #[command(alias = "ls")]
    List,
    /// Reopen a recent document
    Open {
        /// Document reference as shown by `recent list`
        reference: String,
    },
    /// Forget a recent document
    #[command(alias = "rm")]
    Remove {
        /// Document reference as shown by `recent list`
        reference: String,
    },
}

#[derive(Subcommand)]
enum BookmarkCommands {
    /// Bookmark a page
    #[command(alias = "create")]
    Add {
        /// Document path or reference
        document: String,
        /// Page number, starting at 1
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
        page: u32,
        /// Bookmark title
        #[arg(short = 'T', long)]
        title: String,
        /// Optional summary
        #[arg(short, long)]
        summary: Option<String>,
    },
    /// List a document's bookmarks, newest first
    #[command(alias = "ls")]
    List {
        /// Document path or reference
        document: String,
        /// Only show bookmarks whose title or summary contains this text
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Delete a bookmark
    #[command(alias = "rm")]
    Delete {
        /// Bookmark ID
        id: i64,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Print the config file location
    Path,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, log_file)
        key: String,
        /// Configuration value
        value: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    match run(cli, &output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            if let Some(hint) = storage_hint(&e) {
                eprintln!("Hint: {}", hint);
            }
            ExitCode::FAILURE
        }
    }
}

/// Recovery suggestion of the storage error behind `error`, if any
fn storage_hint(error: &anyhow::Error) -> Option<&'static str> {
    error
        .chain()
        .find_map(|cause| cause.downcast_ref::<StorageError>())
        .and_then(StorageError::recovery_suggestion)
}

fn run(cli: Cli, output: &Output) -> Result<()> {
    // Config commands must work even with a broken data directory
    if let Commands::Config { command } = &cli.command {
        return handle_config_command(command.clone(), output);
    }

    let config = Config::load()?;
    init_logging(&config);

    match cli.command {
        Commands::Open { path } => commands::open::open(&config, &path, output),
        Commands::Recent { command } => handle_recent_command(command, config, output),
        Commands::Bookmark { command } => {
            let mut store = Store::open_with_config(config)?;
            handle_bookmark_command(command, &mut store, output)
        }
        Commands::Config { .. } => unreachable!(), // Handled above
    }
}

fn handle_recent_command(
    command: Option<RecentCommands>,
    config: Config,
    output: &Output,
) -> Result<()> {
    match command {
        Some(RecentCommands::List) | None => {
            let store = Store::open_with_config(config)?;
            commands::recent::list(&store, output)
        }
        Some(RecentCommands::Open { reference }) => {
            commands::open::open_recent(&config, &reference, output)
        }
        Some(RecentCommands::Remove { reference }) => {
            let mut store = Store::open_with_config(config)?;
            commands::recent::remove(&mut store, reference, output)
        }
    }
}

fn handle_bookmark_command(
    command: BookmarkCommands,
    store: &mut Store,
    output: &Output,
) -> Result<()> {
    match command {
        BookmarkCommands::Add {
            document,
            page,
            title,
            summary,
        } => commands::bookmark::add(store, document, page, title, summary, output),
        BookmarkCommands::List { document, search } => {
            commands::bookmark::list(store, document, search, output)
        }
        BookmarkCommands::Delete { id } => commands::bookmark::delete(store, id, output),
    }
}

fn handle_config_command(command: Option<ConfigCommands>, output: &Output) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(output),
        Some(ConfigCommands::Path) => commands::config::path(output),
        Some(ConfigCommands::Set { key, value }) => commands::config::set(key, value, output),
    }
}

/// Initialize logging when LEAFMARK_LOG is set
///
/// Logs go to the configured log file, or stderr when none is set.
fn init_logging(config: &Config) {
    let Ok(log_level) = std::env::var("LEAFMARK_LOG") else {
        return;
    };

    let env_filter = EnvFilter::new(format!(
        "leafmark_core={},leafmark_cli={}",
        log_level, log_level
    ));

    let Some(log_path) = config.log_file.as_ref() else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
        return;
    };

    let log_file = match OpenOptions::new().create(true).append(true).open(log_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not open log file {:?}: {}", log_path, e);
            return;
        }
    };

    // Ignore error if already initialized
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(log_file)
        .try_init();

    info!("Logging initialized to {:?}", log_path);
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use std::io;
    use std::path::PathBuf;

    #[test]
    fn test_storage_hint_found_through_context() {
        let err = Err::<(), _>(StorageError::from_io(
            io::Error::new(io::ErrorKind::Other, "No space left on device"),
            PathBuf::from("/data/preferences.json.tmp"),
        ))
        .context("Failed to save recent files")
        .unwrap_err();

        assert_eq!(storage_hint(&err), Some("Free up disk space and try again."));
    }

    #[test]
    fn test_no_hint_for_other_errors() {
        let err = anyhow::anyhow!("Bookmark not found: 7");
        assert_eq!(storage_hint(&err), None);
    }
}
