//! Live view of the store's tables and columns.
//!
//! Nothing here is cached: every call re-reads `sqlite_master` or
//! `pragma_table_info`, so tables created or altered outside the process are
//! seen on the next lookup.

use crate::error::{Error, Result};
use rusqlite::Connection;

/// Prefix reserved for importer staging tables.
pub const STAGING_PREFIX: &str = "_cinedb_staging_";

/// Catalog queries over a borrowed connection.
#[derive(Clone, Copy)]
pub struct Catalog<'conn> {
    conn: &'conn Connection,
}

impl<'conn> Catalog<'conn> {
    /// Create a catalog view over the connection.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// List user tables, sorted by name.
    pub fn tables(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
        )?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(names
            .into_iter()
            .filter(|name| !is_internal(name) && !name.starts_with(STAGING_PREFIX))
            .collect())
    }

    /// Resolve a table name to its catalog spelling.
    ///
    /// SQLite identifiers are ASCII case-insensitive, so the match is too.
    pub fn resolve_table(&self, name: &str) -> Result<String> {
        let found = self
            .tables()?
            .into_iter()
            .find(|t| t.eq_ignore_ascii_case(name.trim()));
        tracing::debug!(table = name, resolved = ?found, "catalog table lookup");
        found.ok_or_else(|| Error::UnknownTable(name.to_string()))
    }

    /// Ordered column names of a table.
    pub fn columns(&self, table: &str) -> Result<Vec<String>> {
        let table = self.resolve_table(table)?;
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM pragma_table_info(?1) ORDER BY cid")?;
        let columns = stmt
            .query_map([&table], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(columns)
    }

    /// Resolve a column of an already resolved table.
    pub fn resolve_column(&self, table: &str, column: &str) -> Result<String> {
        let columns = self.columns(table)?;
        columns
            .into_iter()
            .find(|c| c.eq_ignore_ascii_case(column.trim()))
            .ok_or_else(|| Error::UnknownColumn {
                table: table.to_string(),
                column: column.to_string(),
            })
    }

    /// Whether a table exists.
    pub fn has_table(&self, name: &str) -> Result<bool> {
        match self.resolve_table(name) {
            Ok(_) => Ok(true),
            Err(Error::UnknownTable(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// SQLite reserves every name starting with `sqlite_`, in any case.
fn is_internal(name: &str) -> bool {
    name.len() >= 7 && name.as_bytes()[..7].eq_ignore_ascii_case(b"sqlite_")
}

/// Quote an identifier for statement text.
///
/// Only call this on names that came from the catalog or from the importer.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE movies (id INTEGER, title TEXT, genres TEXT);
             CREATE TABLE credits (movie_id INTEGER, \"cast\" TEXT);
             CREATE TABLE _cinedb_staging_movies (id INTEGER);",
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_tables_hide_staging() {
        let conn = conn();
        let catalog = Catalog::new(&conn);
        assert_eq!(catalog.tables().unwrap(), vec!["credits", "movies"]);
    }

    #[test]
    fn test_tables_named_like_internals_are_listed() {
        let conn = conn();
        conn.execute_batch(
            "CREATE TABLE sqlitex (a); CREATE TABLE SQLiteData (b); \
             CREATE TABLE t_auto (id INTEGER PRIMARY KEY AUTOINCREMENT)",
        )
        .unwrap();
        let catalog = Catalog::new(&conn);
        let tables = catalog.tables().unwrap();
        assert!(tables.contains(&"sqlitex".to_string()));
        assert!(tables.contains(&"SQLiteData".to_string()));
        // AUTOINCREMENT creates sqlite_sequence, which stays hidden
        assert!(!tables.iter().any(|t| t == "sqlite_sequence"));
        assert_eq!(catalog.columns("sqlitex").unwrap(), vec!["a"]);
    }

    #[test]
    fn test_columns_in_declared_order() {
        let conn = conn();
        let catalog = Catalog::new(&conn);
        assert_eq!(
            catalog.columns("movies").unwrap(),
            vec!["id", "title", "genres"]
        );
        assert_eq!(catalog.columns("MOVIES").unwrap().len(), 3);
    }

    #[test]
    fn test_unknown_names() {
        let conn = conn();
        let catalog = Catalog::new(&conn);
        assert!(matches!(
            catalog.columns("nope"),
            Err(Error::UnknownTable(t)) if t == "nope"
        ));
        assert!(matches!(
            catalog.resolve_column("movies", "rating"),
            Err(Error::UnknownColumn { .. })
        ));
        assert!(!catalog.has_table("movies; DROP TABLE movies").unwrap());
    }

    #[test]
    fn test_resolve_returns_catalog_spelling() {
        let conn = conn();
        let catalog = Catalog::new(&conn);
        assert_eq!(catalog.resolve_table("Movies").unwrap(), "movies");
        assert_eq!(catalog.resolve_column("movies", "TITLE").unwrap(), "title");
    }

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("cast"), "\"cast\"");
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_sees_outside_changes() {
        let conn = conn();
        let catalog = Catalog::new(&conn);
        conn.execute("ALTER TABLE movies ADD COLUMN runtime REAL", [])
            .unwrap();
        assert_eq!(catalog.columns("movies").unwrap().last().unwrap(), "runtime");
    }
}
