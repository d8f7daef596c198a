//! cinedb command-line client
//!
//! Imports the movie exports into SQLite and edits the resulting tables,
//! interactively or from the command line.

mod commands;
mod completer;
mod config;
mod formatter;
mod repl;

use cinedb_core::Store;
use clap::Parser;
use commands::{CommandError, CommandResult, Session};
use config::{SessionConfig, DEFAULT_CREDITS_CSV, DEFAULT_DB_PATH, DEFAULT_MOVIES_CSV};
use formatter::OutputFormat;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// cinedb command-line client
#[derive(Parser, Debug)]
#[command(name = "cinedb")]
#[command(version, about = "Import movie CSV exports into SQLite and edit their rows")]
pub struct Args {
    /// SQLite database file
    #[arg(long, default_value = DEFAULT_DB_PATH)]
    pub db: PathBuf,

    /// Movies export used by `.import movies`
    #[arg(long, default_value = DEFAULT_MOVIES_CSV)]
    pub movies_csv: PathBuf,

    /// Credits export used by `.import credits`
    #[arg(long, default_value = DEFAULT_CREDITS_CSV)]
    pub credits_csv: PathBuf,

    /// Execute a single command and exit
    #[arg(short = 'c', long)]
    pub command: Option<String>,

    /// Execute commands from file
    #[arg(short = 'f', long)]
    pub file: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "table", value_enum)]
    pub format: OutputFormat,

    /// Reject free-form statements that modify the database
    #[arg(long)]
    pub read_only_queries: bool,
}

impl Args {
    /// Convert command-line arguments to session configuration.
    pub fn into_config(self) -> SessionConfig {
        SessionConfig::new(self.db)
            .with_movies_csv(self.movies_csv)
            .with_credits_csv(self.credits_csv)
            .with_format(self.format)
            .with_read_only_queries(self.read_only_queries)
    }
}

fn main() {
    // Logs go to stderr so results on stdout stay machine-readable.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("cinedb_cli=info,cinedb_core=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Run the selected mode. `Ok(false)` means a `-c` command failed.
fn run(args: Args) -> Result<bool, Box<dyn std::error::Error>> {
    let command = args.command.clone();
    let file = args.file.clone();
    let config = args.into_config();

    let store = Store::open(&config.db_path)?;
    tracing::debug!(db = %config.db_path.display(), "database opened");

    // Determine which mode to run in
    let succeeded = if let Some(command) = &command {
        run_command_mode(&store, &config, command)
    } else if let Some(file) = &file {
        run_script_mode(&store, &config, file)?;
        true
    } else {
        repl::run(&store, &config)?;
        true
    };

    store.close()?;
    Ok(succeeded)
}

/// Execute a single command.
fn run_command_mode(store: &Store, config: &SessionConfig, command: &str) -> bool {
    let session = Session::new(store, config);
    let formatter = formatter::create_formatter(session.format);

    match execute(&session, command) {
        Ok(result) => {
            if let Some(output) = result.render(&*formatter) {
                println!("{}", output);
            }
            true
        }
        Err(e) => {
            eprintln!("{}", formatter.format_error(&e.to_string()));
            false
        }
    }
}

/// Execute commands from a file, one per line.
fn run_script_mode(
    store: &Store,
    config: &SessionConfig,
    file: &PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(file)?;
    let mut session = Session::new(store, config);

    // Split by lines, filter empty lines and comments
    let statements: Vec<&str> = content
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty() && !l.starts_with("--") && !l.starts_with('#'))
        .collect();

    for statement in statements {
        let formatter = formatter::create_formatter(session.format);
        match execute(&session, statement) {
            Ok(CommandResult::Exit) => break,
            Ok(CommandResult::SetFormat(fmt)) => session.format = fmt,
            Ok(result) => {
                if let Some(output) = result.render(&*formatter) {
                    println!("{}", output);
                }
            }
            Err(e) => {
                eprintln!("Error executing '{}': {}", statement, e);
                // Continue with next statement
            }
        }
    }

    Ok(())
}

/// Run one line outside the REPL, where there is nobody to prompt.
fn execute(session: &Session<'_>, line: &str) -> Result<CommandResult, CommandError> {
    match commands::handle_line(session, line)? {
        CommandResult::PromptInsert { columns, .. } => Err(CommandError::InvalidArgument(format!(
            "values required outside the REPL, one per column: {}",
            columns.join(", ")
        ))),
        other => Ok(other),
    }
}
