//! Catalog-driven row editing.
//!
//! Identifiers (table and column names) are checked against the live
//! catalog and quoted before they reach statement text; values are always
//! bound as parameters. Each write runs in its own transaction.

use crate::catalog::{quote_ident, Catalog};
use crate::error::{Error, Result};
use crate::result::ResultSet;
use crate::store::atomically;
use crate::value::Value;
use rusqlite::{params, Batch, Connection, Statement};

/// Default row limit for [`RowEditor::preview`].
pub const DEFAULT_PREVIEW_LIMIT: usize = 10;

/// Behaviour switches for the editor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditorOptions {
    /// Reject free-form statements that would modify the database.
    pub read_only_queries: bool,
}

/// Row-level operations over one connection.
pub struct RowEditor<'conn> {
    conn: &'conn Connection,
    options: EditorOptions,
}

impl<'conn> RowEditor<'conn> {
    /// Create an editor with default options.
    pub fn new(conn: &'conn Connection) -> Self {
        Self::with_options(conn, EditorOptions::default())
    }

    /// Create an editor with explicit options.
    pub fn with_options(conn: &'conn Connection, options: EditorOptions) -> Self {
        Self { conn, options }
    }

    fn catalog(&self) -> Catalog<'conn> {
        Catalog::new(self.conn)
    }

    /// Ordered columns of a table.
    pub fn list_columns(&self, table: &str) -> Result<Vec<String>> {
        self.catalog().columns(table)
    }

    /// Insert one row; `values` must align with [`list_columns`](Self::list_columns).
    pub fn insert_row(&self, table: &str, values: &[Value]) -> Result<usize> {
        let catalog = self.catalog();
        let table = catalog.resolve_table(table)?;
        let columns = catalog.columns(&table)?;
        if values.len() != columns.len() {
            return Err(Error::InvalidInput(format!(
                "table '{}' has {} columns ({}), got {} values",
                table,
                columns.len(),
                columns.join(", "),
                values.len()
            )));
        }

        let column_list: Vec<String> = columns.iter().map(|c| quote_ident(c)).collect();
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(&table),
            column_list.join(", "),
            placeholders.join(", ")
        );
        self.write(&sql, rusqlite::params_from_iter(values.iter()))
    }

    /// Run a free-form statement verbatim and collect whatever it returns.
    ///
    /// Statements that return no columns yield an affected-row count instead.
    /// `sql` must hold exactly one statement; a trailing `;` is fine.
    pub fn run_query(&self, sql: &str) -> Result<ResultSet> {
        let mut batch = Batch::new(self.conn, sql.trim());
        let Some(mut stmt) = batch.next().map_err(query_error)? else {
            return Err(Error::Query("empty statement".to_string()));
        };
        if batch.next().map_err(query_error)?.is_some() {
            return Err(Error::Query(
                "only one statement can be run at a time".to_string(),
            ));
        }
        if !stmt.readonly() {
            if self.options.read_only_queries {
                return Err(Error::Query(
                    "statement would modify the database and read-only queries are enforced"
                        .to_string(),
                ));
            }
            tracing::warn!(sql, "free-form statement modifies the database");
        }

        if stmt.column_count() == 0 {
            // sqlite3_changes() keeps the last DML count across DDL, so diff the total
            let before = self.total_changes()?;
            stmt.execute([]).map_err(query_error)?;
            let affected = self.total_changes()?.saturating_sub(before);
            return Ok(ResultSet::affected(affected));
        }
        collect_rows(&mut stmt, []).map_err(query_error)
    }

    /// First `limit` rows of a table.
    pub fn preview(&self, table: &str, limit: usize) -> Result<ResultSet> {
        let table = self.catalog().resolve_table(table)?;
        let sql = format!("SELECT * FROM {} LIMIT ?1", quote_ident(&table));
        let mut stmt = self.conn.prepare(&sql)?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        Ok(collect_rows(&mut stmt, [limit])?)
    }

    /// `UPDATE table SET set_column = set_value WHERE filter_column = filter_value`.
    pub fn update_rows(
        &self,
        table: &str,
        set_column: &str,
        set_value: &Value,
        filter_column: &str,
        filter_value: &Value,
    ) -> Result<usize> {
        let catalog = self.catalog();
        let table = catalog.resolve_table(table)?;
        let set_column = catalog.resolve_column(&table, set_column)?;
        let filter_column = catalog.resolve_column(&table, filter_column)?;

        let sql = format!(
            "UPDATE {} SET {} = ?1 WHERE {} = ?2",
            quote_ident(&table),
            quote_ident(&set_column),
            quote_ident(&filter_column)
        );
        self.write(&sql, params![set_value, filter_value])
    }

    /// `DELETE FROM table WHERE filter_column = filter_value`.
    pub fn delete_rows(&self, table: &str, filter_column: &str, filter_value: &Value) -> Result<usize> {
        let catalog = self.catalog();
        let table = catalog.resolve_table(table)?;
        let filter_column = catalog.resolve_column(&table, filter_column)?;

        let sql = format!(
            "DELETE FROM {} WHERE {} = ?1",
            quote_ident(&table),
            quote_ident(&filter_column)
        );
        self.write(&sql, params![filter_value])
    }

    fn total_changes(&self) -> Result<usize> {
        let total: i64 = self
            .conn
            .query_row("SELECT total_changes()", [], |row| row.get(0))?;
        Ok(usize::try_from(total).unwrap_or(0))
    }

    /// Execute one write in its own transaction.
    fn write<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<usize> {
        tracing::debug!(sql, "executing write");
        atomically(self.conn, |conn| Ok(conn.execute(sql, params)?))
    }
}

/// Drain a prepared statement into a result set.
pub(crate) fn collect_rows<P: rusqlite::Params>(
    stmt: &mut Statement<'_>,
    params: P,
) -> rusqlite::Result<ResultSet> {
    let mut result = ResultSet::new(stmt.column_names());
    let width = result.columns.len();
    let mut rows = stmt.query(params)?;
    while let Some(row) = rows.next()? {
        let values = (0..width)
            .map(|i| row.get_ref(i).map(Value::from))
            .collect::<rusqlite::Result<Vec<_>>>()?;
        result.push(values);
    }
    Ok(result)
}

fn query_error(err: rusqlite::Error) -> Error {
    Error::Query(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE t (id INTEGER PRIMARY KEY, x TEXT);
             INSERT INTO t VALUES (1, 'a'), (2, 'b');",
        )
        .unwrap();
        conn
    }

    fn ids(conn: &Connection) -> Vec<i64> {
        let mut stmt = conn.prepare("SELECT id FROM t ORDER BY id").unwrap();
        let ids = stmt
            .query_map([], |r| r.get(0))
            .unwrap()
            .collect::<rusqlite::Result<Vec<i64>>>()
            .unwrap();
        ids
    }

    #[test]
    fn test_delete_scoped_to_filter() {
        let conn = setup();
        let editor = RowEditor::new(&conn);
        let n = editor.delete_rows("t", "id", &Value::Integer(1)).unwrap();
        assert_eq!(n, 1);
        let rs = editor.run_query("SELECT id, x FROM t").unwrap();
        assert_eq!(rs.rows, vec![vec![Value::Integer(2), Value::from("b")]]);
    }

    #[test]
    fn test_update_no_match_is_zero() {
        let conn = setup();
        let editor = RowEditor::new(&conn);
        let n = editor
            .update_rows("t", "x", &Value::from("z"), "id", &Value::Integer(42))
            .unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn test_update_text_filter_matches_integer_column() {
        let conn = setup();
        let editor = RowEditor::new(&conn);
        let n = editor
            .update_rows("t", "x", &Value::from("z"), "id", &Value::from("2"))
            .unwrap();
        assert_eq!(n, 1);
    }

    #[test]
    fn test_insert_aligned_with_catalog() {
        let conn = setup();
        let editor = RowEditor::new(&conn);
        let columns = editor.list_columns("t").unwrap();
        assert_eq!(columns, vec!["id", "x"]);
        editor
            .insert_row("t", &[Value::Integer(3), Value::from("c")])
            .unwrap();
        assert_eq!(ids(&conn), vec![1, 2, 3]);
    }

    #[test]
    fn test_insert_wrong_arity() {
        let conn = setup();
        let editor = RowEditor::new(&conn);
        let err = editor.insert_row("t", &[Value::Integer(3)]).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_insert_constraint_violation() {
        let conn = setup();
        let editor = RowEditor::new(&conn);
        let err = editor
            .insert_row("t", &[Value::Integer(1), Value::from("dup")])
            .unwrap_err();
        assert!(matches!(err, Error::ConstraintViolation(_)), "{err:?}");
        assert_eq!(ids(&conn), vec![1, 2]);
    }

    #[test]
    fn test_unknown_identifiers_rejected() {
        let conn = setup();
        let editor = RowEditor::new(&conn);
        assert!(matches!(
            editor.delete_rows("t; DROP TABLE t", "id", &Value::Integer(1)),
            Err(Error::UnknownTable(_))
        ));
        assert!(matches!(
            editor.delete_rows("t", "id = id OR 1", &Value::Integer(1)),
            Err(Error::UnknownColumn { .. })
        ));
        assert_eq!(ids(&conn), vec![1, 2]);
    }

    #[test]
    fn test_run_query_shapes() {
        let conn = setup();
        let editor = RowEditor::new(&conn);

        let rs = editor.run_query("SELECT count(*) AS n FROM t").unwrap();
        assert_eq!(rs.columns, vec!["n"]);
        assert_eq!(rs.rows, vec![vec![Value::Integer(2)]]);

        let rs = editor.run_query("UPDATE t SET x = 'q'").unwrap();
        assert_eq!(rs.affected, Some(2));

        assert!(matches!(editor.run_query("SELEC 1"), Err(Error::Query(_))));
        assert!(matches!(editor.run_query("  "), Err(Error::Query(_))));
        assert!(matches!(
            editor.run_query("SELECT 1; DROP TABLE t"),
            Err(Error::Query(_))
        ));
        assert_eq!(ids(&conn), vec![1, 2]);
        assert_eq!(editor.run_query("SELECT 1;").unwrap().len(), 1);
    }

    #[test]
    fn test_ddl_reports_no_affected_rows() {
        let conn = setup();
        let editor = RowEditor::new(&conn);
        assert_eq!(editor.run_query("UPDATE t SET x = 'z'").unwrap().affected, Some(2));
        assert_eq!(
            editor.run_query("CREATE TABLE u (a INTEGER)").unwrap().affected,
            Some(0)
        );
        assert_eq!(editor.run_query("DROP TABLE u").unwrap().affected, Some(0));
    }

    #[test]
    fn test_writes_inside_operator_transaction() {
        let conn = setup();
        let editor = RowEditor::new(&conn);
        editor.run_query("BEGIN").unwrap();

        assert_eq!(editor.delete_rows("t", "id", &Value::Integer(1)).unwrap(), 1);
        assert_eq!(
            editor
                .insert_row("t", &[Value::Integer(3), Value::from("c")])
                .unwrap(),
            1
        );
        // a failed write rolls back only itself
        assert!(matches!(
            editor.insert_row("t", &[Value::Integer(2), Value::from("dup")]),
            Err(Error::ConstraintViolation(_))
        ));
        assert!(!conn.is_autocommit());

        editor.run_query("ROLLBACK").unwrap();
        assert_eq!(ids(&conn), vec![1, 2]);
    }

    #[test]
    fn test_read_only_queries() {
        let conn = setup();
        let editor = RowEditor::with_options(
            &conn,
            EditorOptions {
                read_only_queries: true,
            },
        );
        assert!(editor.run_query("SELECT * FROM t").is_ok());
        assert!(matches!(
            editor.run_query("DELETE FROM t"),
            Err(Error::Query(_))
        ));
        assert_eq!(ids(&conn), vec![1, 2]);
    }

    #[test]
    fn test_preview_limit() {
        let conn = setup();
        let editor = RowEditor::new(&conn);
        let rs = editor.preview("T", 1).unwrap();
        assert_eq!(rs.columns, vec!["id", "x"]);
        assert_eq!(rs.len(), 1);
    }
}
