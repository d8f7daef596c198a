//! The session's single database connection.

use crate::catalog::Catalog;
use crate::editor::{EditorOptions, RowEditor};
use crate::error::Result;
use crate::import::Importer;
use crate::stats::Stats;
use rusqlite::Connection;
use std::path::{Path, PathBuf};

/// A file-backed SQLite store, opened once per session.
pub struct Store {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Store {
    /// Open or create the database file, creating parent directories as needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        tracing::debug!(path = %path.display(), "opened store");
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Open a private in-memory store.
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
            path: None,
        })
    }

    /// Database file path, if file-backed.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Live catalog view.
    pub fn catalog(&self) -> Catalog<'_> {
        Catalog::new(&self.conn)
    }

    /// CSV importer.
    pub fn importer(&self) -> Importer<'_> {
        Importer::new(&self.conn)
    }

    /// Row editor with default options.
    pub fn editor(&self) -> RowEditor<'_> {
        RowEditor::new(&self.conn)
    }

    /// Row editor with explicit options.
    pub fn editor_with(&self, options: EditorOptions) -> RowEditor<'_> {
        RowEditor::with_options(&self.conn, options)
    }

    /// Statistics view.
    pub fn stats(&self) -> Stats<'_> {
        Stats::new(&self.conn)
    }

    /// Close the connection, reporting any error from SQLite.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| e.into())
    }
}

/// Run `f` atomically.
///
/// Outside a transaction this opens one. When the operator already has one
/// open (a free-form `BEGIN`), `f` runs under a savepoint inside it instead.
pub(crate) fn atomically<T>(
    conn: &Connection,
    f: impl FnOnce(&Connection) -> Result<T>,
) -> Result<T> {
    if conn.is_autocommit() {
        let tx = conn.unchecked_transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        return Ok(value);
    }

    conn.execute_batch("SAVEPOINT cinedb_write")?;
    match f(conn) {
        Ok(value) => {
            conn.execute_batch("RELEASE cinedb_write")?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback) =
                conn.execute_batch("ROLLBACK TO cinedb_write; RELEASE cinedb_write")
            {
                tracing::warn!(error = %rollback, "savepoint rollback failed");
            }
            Err(e)
        }
    }
}
