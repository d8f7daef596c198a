//! Interactive REPL implementation.

use crate::commands::{self, CommandResult, Session};
use crate::completer::CinedbHelper;
use crate::config::SessionConfig;
use crate::formatter;
use cinedb_core::Store;
use rustyline::error::ReadlineError;
use rustyline::history::{DefaultHistory, History};
use rustyline::{Config, Editor};
use std::path::PathBuf;

type CinedbEditor = Editor<CinedbHelper, DefaultHistory>;

/// Get the history file path.
fn history_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".cinedb_history")
}

/// Run the interactive REPL.
pub fn run(store: &Store, config: &SessionConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = Session::new(store, config);

    // Set up rustyline
    let rl_config = Config::builder()
        .history_ignore_space(true)
        .auto_add_history(true)
        .build();

    let mut rl: CinedbEditor = Editor::with_config(rl_config)?;
    rl.set_helper(Some(CinedbHelper::new()));
    refresh_tables(&mut rl, store);

    // Load history
    let hist_path = history_path();
    if hist_path.exists() {
        let _ = rl.load_history(&hist_path);
    }

    println!(
        "cinedb on {} - Type .help for commands, .exit to quit\n",
        config.db_path.display()
    );

    // Main REPL loop
    loop {
        match rl.readline("cinedb> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let result = match commands::handle_line(&session, line) {
                    Ok(CommandResult::PromptInsert { table, columns }) => {
                        match prompt_values(&mut rl, &columns) {
                            Some(values) => commands::insert_values(&session, &table, &values),
                            None => {
                                println!("Insert cancelled");
                                continue;
                            }
                        }
                    }
                    other => other,
                };

                let formatter = formatter::create_formatter(session.format);
                match result {
                    Ok(CommandResult::Exit) => {
                        println!("Goodbye!");
                        break;
                    }
                    Ok(CommandResult::SetFormat(fmt)) => {
                        session.format = fmt;
                        println!("Output format set to {}", fmt);
                    }
                    Ok(CommandResult::ShowHistory) => {
                        let history = rl.history();
                        let len = history.len();
                        let start = len.saturating_sub(20);
                        for (i, entry) in history.iter().skip(start).enumerate() {
                            println!("{:4}  {}", start + i + 1, entry);
                        }
                    }
                    Ok(CommandResult::Clear) => {
                        // ANSI clear screen
                        print!("\x1B[2J\x1B[1;1H");
                    }
                    Ok(output) => {
                        if let Some(text) = output.render(&*formatter) {
                            println!("{}", text);
                        }
                    }
                    Err(e) => {
                        println!("{}", formatter.format_error(&e.to_string()));
                    }
                }

                // Imports and free-form statements can change the catalog.
                refresh_tables(&mut rl, store);
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("Goodbye!");
                break;
            }
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }

    // Save history
    let _ = rl.save_history(&hist_path);

    Ok(())
}

/// Read one value per column. `None` if the operator interrupts.
fn prompt_values(rl: &mut CinedbEditor, columns: &[String]) -> Option<Vec<String>> {
    println!("Enter a value for each column (empty for NULL, Ctrl-C to cancel)");
    let mut values = Vec::with_capacity(columns.len());
    for column in columns {
        match rl.readline(&format!("  {}: ", column)) {
            Ok(value) => values.push(value.trim().to_string()),
            Err(_) => return None,
        }
    }
    Some(values)
}

fn refresh_tables(rl: &mut CinedbEditor, store: &Store) {
    match store.catalog().tables() {
        Ok(tables) => {
            if let Some(helper) = rl.helper_mut() {
                helper.set_tables(tables);
            }
        }
        Err(e) => tracing::debug!(error = %e, "could not refresh table names"),
    }
}
