//! Tab completion for the REPL.

use crate::commands;
use cinedb_core::MovieReport;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};
use std::borrow::Cow;

/// REPL helper with completion support.
pub struct CinedbHelper {
    /// Cached table names from the catalog.
    pub tables: Vec<String>,
    commands: Vec<&'static str>,
}

impl CinedbHelper {
    /// Create a new helper with empty table list.
    pub fn new() -> Self {
        Self {
            tables: Vec::new(),
            commands: commands::command_names(),
        }
    }

    /// Update the table list.
    pub fn set_tables(&mut self, tables: Vec<String>) {
        self.tables = tables;
    }
}

impl Default for CinedbHelper {
    fn default() -> Self {
        Self::new()
    }
}

/// SQL keywords offered for free-form statements.
const SQL_KEYWORDS: &[&str] = &[
    "SELECT", "FROM", "WHERE", "GROUP BY", "ORDER BY", "LIMIT", "DESC", "COUNT", "AVG",
    "INSERT", "UPDATE", "DELETE", "AND", "OR", "NOT", "NULL", "LIKE",
];

fn pair(candidate: &str) -> Pair {
    Pair {
        display: candidate.to_string(),
        replacement: candidate.to_string(),
    }
}

fn starts_with_ignore_case(candidate: &str, prefix: &str) -> bool {
    candidate.len() >= prefix.len()
        && candidate.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}

impl Completer for CinedbHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line_to_cursor = &line[..pos];

        // Find the start of the current word
        let word_start = line_to_cursor
            .rfind(|c: char| c.is_whitespace() || c == '(' || c == ',')
            .map(|i| i + 1)
            .unwrap_or(0);
        let word = &line_to_cursor[word_start..];

        // Dot commands at start of line
        let trimmed = line_to_cursor.trim_start();
        if trimmed.starts_with('.') && !trimmed.contains(' ') {
            let completions = self
                .commands
                .iter()
                .filter(|cmd| cmd.starts_with(trimmed))
                .map(|cmd| pair(cmd))
                .collect();
            return Ok((word_start, completions));
        }

        // Report names after .stats
        let first = trimmed.split_whitespace().next().unwrap_or("");
        let arg_index = trimmed[..trimmed.len() - word.len()].split_whitespace().count();
        if first.eq_ignore_ascii_case(".stats") && arg_index == 1 {
            let completions = MovieReport::ALL
                .iter()
                .map(|r| r.name())
                .filter(|name| name.starts_with(word))
                .map(pair)
                .collect();
            return Ok((word_start, completions));
        }

        let mut completions: Vec<Pair> = self
            .tables
            .iter()
            .filter(|table| starts_with_ignore_case(table, word))
            .map(|table| pair(table))
            .collect();

        if !commands::is_command(trimmed) && !word.is_empty() {
            completions.extend(
                SQL_KEYWORDS
                    .iter()
                    .filter(|kw| starts_with_ignore_case(kw, word))
                    .map(|kw| pair(kw)),
            );
        }

        Ok((word_start, completions))
    }
}

impl Hinter for CinedbHelper {
    type Hint = String;

    fn hint(&self, _line: &str, _pos: usize, _ctx: &Context<'_>) -> Option<String> {
        None
    }
}

impl Highlighter for CinedbHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        Cow::Borrowed(line)
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: rustyline::highlight::CmdKind) -> bool {
        false
    }
}

impl Validator for CinedbHelper {}

impl Helper for CinedbHelper {}
