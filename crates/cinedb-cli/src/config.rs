//! Session configuration.

use crate::formatter::OutputFormat;
use cinedb_core::EditorOptions;
use std::path::PathBuf;

/// Default database file.
pub const DEFAULT_DB_PATH: &str = "data/imdb_db.sqlite";

/// Default movies export.
pub const DEFAULT_MOVIES_CSV: &str = "data/tmdb_5000_movies.csv";

/// Default credits export.
pub const DEFAULT_CREDITS_CSV: &str = "data/tmdb_5000_credits.csv";

/// Table the movies preset imports into.
pub const MOVIES_TABLE: &str = "movies";

/// Table the credits preset imports into.
pub const CREDITS_TABLE: &str = "credits";

/// Settings shared by every command of a session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// SQLite database file.
    pub db_path: PathBuf,
    /// Source used by `.import movies` without a path.
    pub movies_csv: PathBuf,
    /// Source used by `.import credits` without a path.
    pub credits_csv: PathBuf,
    /// Initial output format.
    pub format: OutputFormat,
    /// Reject free-form statements that modify the database.
    pub read_only_queries: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            movies_csv: PathBuf::from(DEFAULT_MOVIES_CSV),
            credits_csv: PathBuf::from(DEFAULT_CREDITS_CSV),
            format: OutputFormat::Table,
            read_only_queries: false,
        }
    }
}

impl SessionConfig {
    /// Create a configuration for the given database file.
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            ..Default::default()
        }
    }

    /// Set the movies source.
    pub fn with_movies_csv(mut self, path: impl Into<PathBuf>) -> Self {
        self.movies_csv = path.into();
        self
    }

    /// Set the credits source.
    pub fn with_credits_csv(mut self, path: impl Into<PathBuf>) -> Self {
        self.credits_csv = path.into();
        self
    }

    /// Set the initial output format.
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Reject mutating free-form statements.
    pub fn with_read_only_queries(mut self, read_only: bool) -> Self {
        self.read_only_queries = read_only;
        self
    }

    /// Editor options derived from this configuration.
    pub fn editor_options(&self) -> EditorOptions {
        EditorOptions {
            read_only_queries: self.read_only_queries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SessionConfig::default();
        assert_eq!(config.db_path, PathBuf::from(DEFAULT_DB_PATH));
        assert_eq!(config.movies_csv, PathBuf::from(DEFAULT_MOVIES_CSV));
        assert_eq!(config.credits_csv, PathBuf::from(DEFAULT_CREDITS_CSV));
        assert!(!config.editor_options().read_only_queries);
    }

    #[test]
    fn test_config_builder() {
        let config = SessionConfig::new("/tmp/x.sqlite")
            .with_movies_csv("m.csv")
            .with_format(OutputFormat::Json)
            .with_read_only_queries(true);
        assert_eq!(config.db_path, PathBuf::from("/tmp/x.sqlite"));
        assert_eq!(config.movies_csv, PathBuf::from("m.csv"));
        assert_eq!(config.credits_csv, PathBuf::from(DEFAULT_CREDITS_CSV));
        assert_eq!(config.format, OutputFormat::Json);
        assert!(config.editor_options().read_only_queries);
    }
}
