//! CSV import with nested-field flattening and full-replace writes.
//!
//! An import parses the whole file, flattens nested cells, projects to the
//! configured columns and only then touches the database. The write goes to
//! a staging table which is renamed over the target inside one transaction,
//! so a failed import leaves any previous table untouched.

mod frame;
mod nested;
mod spec;

pub use frame::SourceFrame;
pub use nested::{FlattenRule, NestedFieldSpec, DEFAULT_DELIMITER, DEFAULT_FIRST_N};
pub use spec::ImportSpec;

use crate::catalog::{quote_ident, STAGING_PREFIX};
use crate::error::{Error, Result};
use crate::store::atomically;
use crate::value::{ColumnType, Value};
use rusqlite::{params_from_iter, Connection};
use std::collections::HashSet;
use std::path::Path;

/// Imports source files into tables of one connection.
pub struct Importer<'conn> {
    conn: &'conn Connection,
}

impl<'conn> Importer<'conn> {
    /// Create an importer over the connection.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Import a CSV file into `table`, replacing it entirely.
    ///
    /// Returns the number of rows written, which always equals the number of
    /// data rows in the source.
    pub fn import_table(&self, source: &Path, table: &str, spec: &ImportSpec) -> Result<usize> {
        let frame = normalize(SourceFrame::read_csv(source)?, spec)?;
        let row_count = frame.row_count();
        self.replace_table(table, frame, spec)?;

        tracing::info!(
            source = %source.display(),
            table,
            rows = row_count,
            "import complete"
        );
        Ok(row_count)
    }

    /// Write a normalized frame under `table` with drop-and-recreate semantics.
    pub fn replace_table(&self, table: &str, frame: SourceFrame, spec: &ImportSpec) -> Result<()> {
        validate_target(table, frame.headers())?;

        let headers = frame.headers().to_vec();
        let types = column_types(&frame, spec);
        let rows = frame.into_rows();

        let staging = format!("{STAGING_PREFIX}{table}");
        let column_defs: Vec<String> = headers
            .iter()
            .zip(&types)
            .map(|(name, ty)| format!("{} {}", quote_ident(name), ty.sql_name()))
            .collect();
        let column_list: Vec<String> = headers.iter().map(|h| quote_ident(h)).collect();
        let placeholders: Vec<String> = (1..=headers.len()).map(|i| format!("?{i}")).collect();

        let create = format!(
            "CREATE TABLE {} ({})",
            quote_ident(&staging),
            column_defs.join(", ")
        );
        let insert = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(&staging),
            column_list.join(", "),
            placeholders.join(", ")
        );
        tracing::debug!(sql = %create, "creating staging table");
        tracing::debug!(sql = %insert, "loading staging table");

        atomically(self.conn, |tx| {
            tx.execute(&format!("DROP TABLE IF EXISTS {}", quote_ident(&staging)), [])?;
            tx.execute(&create, [])?;
            {
                let mut stmt = tx.prepare(&insert)?;
                for row in &rows {
                    let values = row.iter().zip(&types).enumerate().map(|(idx, (cell, ty))| {
                        typed_cell(cell, *ty, spec.is_flattened(&headers[idx]))
                    });
                    stmt.execute(params_from_iter(values))?;
                }
            }
            tx.execute(&format!("DROP TABLE IF EXISTS {}", quote_ident(table)), [])?;
            tx.execute(
                &format!(
                    "ALTER TABLE {} RENAME TO {}",
                    quote_ident(&staging),
                    quote_ident(table)
                ),
                [],
            )?;
            Ok(())
        })?;

        tracing::debug!(table, columns = headers.len(), rows = rows.len(), "table replaced");
        Ok(())
    }
}

/// Flatten nested columns, then project.
pub fn normalize(mut frame: SourceFrame, spec: &ImportSpec) -> Result<SourceFrame> {
    for nested in &spec.nested {
        let idx = frame
            .column_index(&nested.source)
            .ok_or_else(|| Error::SchemaProjection {
                column: nested.source.clone(),
                available: frame.headers().join(", "),
            })?;

        let mut fallbacks = 0usize;
        let values: Vec<String> = frame
            .column(idx)
            .map(|raw| {
                nested.flatten(raw).unwrap_or_else(|| {
                    fallbacks += 1;
                    String::new()
                })
            })
            .collect();
        if fallbacks > 0 {
            tracing::warn!(
                column = %nested.source,
                fallbacks,
                "undecodable nested cells stored as empty strings"
            );
        }
        frame.set_column(&nested.target, values);
    }

    match &spec.projection {
        Some(columns) => frame.project(columns),
        None => Ok(frame),
    }
}

fn validate_target(table: &str, headers: &[String]) -> Result<()> {
    if table.trim().is_empty() {
        return Err(Error::InvalidInput("table name is empty".to_string()));
    }
    if table.starts_with(STAGING_PREFIX) {
        return Err(Error::InvalidInput(format!(
            "table names starting with '{STAGING_PREFIX}' are reserved"
        )));
    }
    if headers.is_empty() {
        return Err(Error::InvalidInput("no columns to import".to_string()));
    }
    let mut seen = HashSet::new();
    for header in headers {
        if header.is_empty() {
            return Err(Error::InvalidInput("source has an unnamed column".to_string()));
        }
        if !seen.insert(header.to_ascii_lowercase()) {
            return Err(Error::InvalidInput(format!("duplicate column '{header}'")));
        }
    }
    Ok(())
}

fn column_types(frame: &SourceFrame, spec: &ImportSpec) -> Vec<ColumnType> {
    frame
        .headers()
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            if spec.is_flattened(name) {
                return ColumnType::Text;
            }
            let typed: Vec<Value> = frame.column(idx).map(Value::infer).collect();
            ColumnType::infer(&typed)
        })
        .collect()
}

/// Bound value for one cell; text columns keep the raw text.
fn typed_cell(raw: &str, ty: ColumnType, flattened: bool) -> Value {
    match ty {
        ColumnType::Text if flattened => Value::Text(raw.to_string()),
        _ if raw.is_empty() => Value::Null,
        ColumnType::Text => Value::Text(raw.to_string()),
        ColumnType::Integer | ColumnType::Real => Value::infer(raw),
    }
}
