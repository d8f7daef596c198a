//! Command dispatch.
//!
//! A line starting with `.` is looked up in [`COMMANDS`]; anything else is
//! handed to the row editor as a free-form statement. Dispatch only needs a
//! [`Session`], so the REPL, `-c` and `-f` all share it.

use crate::config::{SessionConfig, CREDITS_TABLE, MOVIES_TABLE};
use crate::formatter::{Formatter, OutputFormat};
use cinedb_core::{ImportSpec, MovieReport, ResultSet, Store, Value, DEFAULT_PREVIEW_LIMIT};
use std::path::PathBuf;
use thiserror::Error;

/// Result of executing a command.
#[derive(Debug)]
pub enum CommandResult {
    /// Nothing to show.
    Continue,
    /// Exit the session.
    Exit,
    /// Message to display.
    Output(String),
    /// Rows to display.
    Rows(ResultSet),
    /// Rows to display under a heading.
    Report(&'static str, ResultSet),
    /// A write finished.
    Affected { count: usize, message: String },
    /// Change the output format.
    SetFormat(OutputFormat),
    /// Show history.
    ShowHistory,
    /// Clear screen.
    Clear,
    /// Ask the operator for one value per column, then insert.
    PromptInsert { table: String, columns: Vec<String> },
}

impl CommandResult {
    /// Render displayable results; session-control results yield `None`.
    pub fn render(&self, formatter: &dyn Formatter) -> Option<String> {
        match self {
            CommandResult::Output(msg) => Some(formatter.format_message(msg)),
            CommandResult::Rows(rows) => Some(formatter.format_result(rows)),
            CommandResult::Report(title, rows) => Some(format!(
                "{}\n{}",
                formatter.format_message(title),
                formatter.format_result(rows)
            )),
            CommandResult::Affected { count, message } => {
                Some(formatter.format_affected(*count, message))
            }
            _ => None,
        }
    }
}

/// Errors raised while dispatching a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Core(#[from] cinedb_core::Error),

    #[error("Unknown command: {0}. Type .help for commands")]
    UnknownCommand(String),

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("Unterminated quote in: {0}")]
    UnterminatedQuote(String),

    #[error("{0}")]
    InvalidArgument(String),
}

/// State a command runs against.
pub struct Session<'a> {
    pub store: &'a Store,
    pub config: &'a SessionConfig,
    pub format: OutputFormat,
}

impl<'a> Session<'a> {
    /// Create a session over an open store.
    pub fn new(store: &'a Store, config: &'a SessionConfig) -> Self {
        Self {
            store,
            config,
            format: config.format,
        }
    }
}

type Handler = fn(&Session<'_>, &[String]) -> Result<CommandResult, CommandError>;

/// One entry of the command table.
pub struct CommandSpec {
    /// Name and aliases, each with the leading dot.
    pub names: &'static [&'static str],
    pub usage: &'static str,
    pub about: &'static str,
    handler: Handler,
}

/// Every dot-command, in help order.
pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        names: &[".import"],
        usage: ".import movies|credits [path]",
        about: "Import a preset export (replaces the table)",
        handler: import,
    },
    CommandSpec {
        names: &[".import"],
        usage: ".import <path> <table>",
        about: "Import every column of a CSV file",
        handler: import,
    },
    CommandSpec {
        names: &[".tables"],
        usage: ".tables",
        about: "List tables",
        handler: tables,
    },
    CommandSpec {
        names: &[".columns"],
        usage: ".columns <table>",
        about: "List the columns of a table",
        handler: columns,
    },
    CommandSpec {
        names: &[".preview"],
        usage: ".preview <table> [n]",
        about: "Show the first rows of a table",
        handler: preview,
    },
    CommandSpec {
        names: &[".insert"],
        usage: ".insert <table> [values...]",
        about: "Insert a row; prompts per column when no values are given",
        handler: insert,
    },
    CommandSpec {
        names: &[".update"],
        usage: ".update <table> <column> <value> <filter_column> <filter_value>",
        about: "Set a column on matching rows",
        handler: update,
    },
    CommandSpec {
        names: &[".delete"],
        usage: ".delete <table> <filter_column> <filter_value>",
        about: "Delete matching rows",
        handler: delete,
    },
    CommandSpec {
        names: &[".stats"],
        usage: ".stats [report] [table]",
        about: "Summary statistics over the movies table",
        handler: stats,
    },
    CommandSpec {
        names: &[".hist"],
        usage: ".hist <table> <column> [bins]",
        about: "Histogram of a numeric column",
        handler: hist,
    },
    CommandSpec {
        names: &[".format"],
        usage: ".format [table|json|csv]",
        about: "Get or set output format",
        handler: format,
    },
    CommandSpec {
        names: &[".history"],
        usage: ".history",
        about: "Show command history",
        handler: |_, _| Ok(CommandResult::ShowHistory),
    },
    CommandSpec {
        names: &[".clear", ".cls"],
        usage: ".clear",
        about: "Clear the screen",
        handler: |_, _| Ok(CommandResult::Clear),
    },
    CommandSpec {
        names: &[".help", ".h", ".?"],
        usage: ".help",
        about: "Show this help message",
        handler: |_, _| Ok(CommandResult::Output(get_help())),
    },
    CommandSpec {
        names: &[".exit", ".quit", ".q"],
        usage: ".exit / .quit",
        about: "Exit",
        handler: |_, _| Ok(CommandResult::Exit),
    },
];

/// Distinct command names, for completion.
pub fn command_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = Vec::new();
    for spec in COMMANDS {
        for name in spec.names {
            if !names.contains(name) {
                names.push(name);
            }
        }
    }
    names
}

/// Check if a line is a dot-command.
pub fn is_command(line: &str) -> bool {
    line.trim().starts_with('.')
}

/// Execute one line of input.
pub fn handle_line(session: &Session<'_>, line: &str) -> Result<CommandResult, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(CommandResult::Continue);
    }
    if !is_command(line) {
        return run_query(session, line);
    }

    let args = split_args(line)?;
    let Some((name, rest)) = args.split_first() else {
        return Ok(CommandResult::Continue);
    };
    let name = name.to_lowercase();
    let spec = COMMANDS
        .iter()
        .find(|spec| spec.names.contains(&name.as_str()))
        .ok_or(CommandError::UnknownCommand(name.clone()))?;
    (spec.handler)(session, rest)
}

/// Insert one row from raw operator input, one value per column.
pub fn insert_values(
    session: &Session<'_>,
    table: &str,
    raw: &[String],
) -> Result<CommandResult, CommandError> {
    let values: Vec<Value> = raw.iter().map(|s| input_value(s)).collect();
    let count = session.store.editor().insert_row(table, &values)?;
    Ok(CommandResult::Affected {
        count,
        message: format!("inserted into {}", table),
    })
}

/// Split a command line on whitespace; single or double quotes group words.
pub fn split_args(line: &str) -> Result<Vec<String>, CommandError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;

    for c in line.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_token = true;
            }
            None if c.is_whitespace() => {
                if in_token {
                    args.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            None => {
                current.push(c);
                in_token = true;
            }
        }
    }

    if quote.is_some() {
        return Err(CommandError::UnterminatedQuote(line.to_string()));
    }
    if in_token {
        args.push(current);
    }
    Ok(args)
}

fn run_query(session: &Session<'_>, sql: &str) -> Result<CommandResult, CommandError> {
    let result = session
        .store
        .editor_with(session.config.editor_options())
        .run_query(sql)?;
    Ok(match result.affected {
        Some(count) => CommandResult::Affected {
            count,
            message: String::new(),
        },
        None => CommandResult::Rows(result),
    })
}

fn import(session: &Session<'_>, args: &[String]) -> Result<CommandResult, CommandError> {
    const USAGE: &str = ".import movies|credits [path] | .import <path> <table>";
    let config = session.config;

    let (path, table, spec): (PathBuf, &str, ImportSpec) = match args {
        [kind] | [kind, _] if kind.eq_ignore_ascii_case(MOVIES_TABLE) => (
            args.get(1).map_or_else(|| config.movies_csv.clone(), PathBuf::from),
            MOVIES_TABLE,
            ImportSpec::movies(),
        ),
        [kind] | [kind, _] if kind.eq_ignore_ascii_case(CREDITS_TABLE) => (
            args.get(1).map_or_else(|| config.credits_csv.clone(), PathBuf::from),
            CREDITS_TABLE,
            ImportSpec::credits(),
        ),
        [path, table] => (PathBuf::from(path), table.as_str(), ImportSpec::all_columns()),
        _ => return Err(CommandError::Usage(USAGE)),
    };

    let count = session.store.importer().import_table(&path, table, &spec)?;
    Ok(CommandResult::Output(format!(
        "Imported {} rows into {} from {}",
        count,
        table,
        path.display()
    )))
}

fn tables(session: &Session<'_>, _args: &[String]) -> Result<CommandResult, CommandError> {
    let mut result = ResultSet::new(["table"]);
    for name in session.store.catalog().tables()? {
        result.push(vec![Value::Text(name)]);
    }
    Ok(CommandResult::Rows(result))
}

fn columns(session: &Session<'_>, args: &[String]) -> Result<CommandResult, CommandError> {
    let [table] = args else {
        return Err(CommandError::Usage(".columns <table>"));
    };
    let mut result = ResultSet::new(["column"]);
    for name in session.store.editor().list_columns(table)? {
        result.push(vec![Value::Text(name)]);
    }
    Ok(CommandResult::Rows(result))
}

fn preview(session: &Session<'_>, args: &[String]) -> Result<CommandResult, CommandError> {
    let (table, limit) = match args {
        [table] => (table, DEFAULT_PREVIEW_LIMIT),
        [table, n] => (table, parse_count(n, "row count")?),
        _ => return Err(CommandError::Usage(".preview <table> [n]")),
    };
    Ok(CommandResult::Rows(session.store.editor().preview(table, limit)?))
}

fn insert(session: &Session<'_>, args: &[String]) -> Result<CommandResult, CommandError> {
    match args {
        [] => Err(CommandError::Usage(".insert <table> [values...]")),
        [table] => {
            let columns = session.store.editor().list_columns(table)?;
            Ok(CommandResult::PromptInsert {
                table: table.clone(),
                columns,
            })
        }
        [table, values @ ..] => insert_values(session, table, values),
    }
}

fn update(session: &Session<'_>, args: &[String]) -> Result<CommandResult, CommandError> {
    let [table, column, value, filter_column, filter_value] = args else {
        return Err(CommandError::Usage(
            ".update <table> <column> <value> <filter_column> <filter_value>",
        ));
    };
    let count = session.store.editor().update_rows(
        table,
        column,
        &input_value(value),
        filter_column,
        &Value::from(filter_value.as_str()),
    )?;
    Ok(CommandResult::Affected {
        count,
        message: format!("updated {}", table),
    })
}

fn delete(session: &Session<'_>, args: &[String]) -> Result<CommandResult, CommandError> {
    let [table, filter_column, filter_value] = args else {
        return Err(CommandError::Usage(
            ".delete <table> <filter_column> <filter_value>",
        ));
    };
    let count =
        session
            .store
            .editor()
            .delete_rows(table, filter_column, &Value::from(filter_value.as_str()))?;
    Ok(CommandResult::Affected {
        count,
        message: format!("deleted from {}", table),
    })
}

fn stats(session: &Session<'_>, args: &[String]) -> Result<CommandResult, CommandError> {
    let (report, table) = match args {
        [] => {
            let mut result = ResultSet::new(["report", "description"]);
            for report in MovieReport::ALL {
                result.push(vec![Value::from(report.name()), Value::from(report.title())]);
            }
            return Ok(CommandResult::Rows(result));
        }
        [report] => (report, MOVIES_TABLE),
        [report, table] => (report, table.as_str()),
        _ => return Err(CommandError::Usage(".stats [report] [table]")),
    };
    let report: MovieReport = report.parse()?;
    let result = report.run(&session.store.stats(), table)?;
    Ok(CommandResult::Report(report.title(), result))
}

fn hist(session: &Session<'_>, args: &[String]) -> Result<CommandResult, CommandError> {
    let (table, column, bins) = match args {
        [table, column] => (table, column, cinedb_core::stats::DEFAULT_BINS),
        [table, column, bins] => (table, column, parse_count(bins, "bin count")?),
        _ => return Err(CommandError::Usage(".hist <table> <column> [bins]")),
    };
    let result = session.store.stats().histogram(table, column, bins, false)?;
    Ok(CommandResult::Rows(result))
}

fn format(session: &Session<'_>, args: &[String]) -> Result<CommandResult, CommandError> {
    match args {
        [] => Ok(CommandResult::Output(format!(
            "Current format: {}",
            session.format
        ))),
        [fmt] => fmt
            .parse()
            .map(CommandResult::SetFormat)
            .map_err(CommandError::InvalidArgument),
        _ => Err(CommandError::Usage(".format [table|json|csv]")),
    }
}

/// Operator input is bound as text so the column's affinity decides the
/// stored type; an empty entry means NULL.
fn input_value(raw: &str) -> Value {
    if raw.is_empty() {
        Value::Null
    } else {
        Value::from(raw)
    }
}

fn parse_count(raw: &str, what: &str) -> Result<usize, CommandError> {
    raw.parse()
        .map_err(|_| CommandError::InvalidArgument(format!("Invalid {}: {}", what, raw)))
}

/// Get help text for commands.
pub fn get_help() -> String {
    let mut help = String::from("Commands\n========\n\n");
    for spec in COMMANDS {
        help.push_str(&format!("{:<66} {}\n", spec.usage, spec.about));
    }
    help.push_str(
        "\nAnything else is run as a single SQL statement, e.g.\n  \
         SELECT title, vote_average FROM movies ORDER BY vote_average DESC LIMIT 5\n\n\
         Quote arguments containing spaces: .update movies title \"New Title\" id 42\n",
    );
    help
}
