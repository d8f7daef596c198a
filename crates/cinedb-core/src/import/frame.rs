//! In-memory column-addressable view of a CSV file.

use crate::error::{Error, Result};
use std::path::Path;

/// A fully parsed CSV source.
#[derive(Debug, Clone, Default)]
pub struct SourceFrame {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl SourceFrame {
    /// Read an entire CSV file with a header row.
    pub fn read_csv(path: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)
            .map_err(|e| Error::source_read(path, e))?;

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| Error::source_read(path, e))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        if headers.iter().all(|h| h.is_empty()) {
            return Err(Error::source_read(path, "no header row"));
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| Error::source_read(path, e))?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        tracing::debug!(
            path = %path.display(),
            columns = headers.len(),
            rows = rows.len(),
            "parsed source file"
        );
        Ok(Self { headers, rows })
    }

    /// Build a frame from parts; rows must match the header width.
    pub fn from_parts(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        debug_assert!(rows.iter().all(|r| r.len() == headers.len()));
        Self { headers, rows }
    }

    /// Column names in source order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Number of data rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Position of a column.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cells of one column, top to bottom.
    pub fn column(&self, idx: usize) -> impl Iterator<Item = &str> + '_ {
        self.rows.iter().map(move |row| row[idx].as_str())
    }

    /// Overwrite a column in place, or append it when the name is new.
    pub fn set_column(&mut self, name: &str, values: Vec<String>) {
        debug_assert_eq!(values.len(), self.rows.len());
        match self.column_index(name) {
            Some(idx) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
            }
            None => {
                self.headers.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
    }

    /// Keep exactly the named columns, in the given order.
    pub fn project(self, columns: &[String]) -> Result<Self> {
        let mut indices = Vec::with_capacity(columns.len());
        for column in columns {
            let idx = self
                .column_index(column)
                .ok_or_else(|| Error::SchemaProjection {
                    column: column.clone(),
                    available: self.headers.join(", "),
                })?;
            indices.push(idx);
        }

        let rows = self
            .rows
            .into_iter()
            .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
            .collect();
        Ok(Self {
            headers: columns.to_vec(),
            rows,
        })
    }

    /// Consume the frame into rows.
    pub fn into_rows(self) -> Vec<Vec<String>> {
        self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_read_quoted_cells() {
        let file = write_csv("id,title,genres\n1,\"Avatar, Extended\",\"[{'name': 'Action'}]\"\n");
        let frame = SourceFrame::read_csv(file.path()).unwrap();
        assert_eq!(frame.headers(), ["id", "title", "genres"]);
        assert_eq!(frame.row_count(), 1);
        let titles: Vec<_> = frame.column(1).collect();
        assert_eq!(titles, vec!["Avatar, Extended"]);
    }

    #[test]
    fn test_missing_file() {
        let err = SourceFrame::read_csv(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, Error::SourceRead { .. }));
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let file = write_csv("a,b\n1,2\n3\n");
        let err = SourceFrame::read_csv(file.path()).unwrap_err();
        assert!(matches!(err, Error::SourceRead { .. }));
    }

    #[test]
    fn test_project_orders_and_drops() {
        let frame = SourceFrame::from_parts(
            vec!["a".into(), "b".into(), "c".into()],
            vec![vec!["1".into(), "2".into(), "3".into()]],
        );
        let projected = frame.project(&["c".into(), "a".into()]).unwrap();
        assert_eq!(projected.headers(), ["c", "a"]);
        assert_eq!(projected.into_rows(), vec![vec!["3", "1"]]);
    }

    #[test]
    fn test_project_missing_column() {
        let frame = SourceFrame::from_parts(vec!["a".into()], vec![]);
        let err = frame.project(&["z".into()]).unwrap_err();
        assert!(matches!(err, Error::SchemaProjection { column, .. } if column == "z"));
    }

    #[test]
    fn test_set_column_appends() {
        let mut frame = SourceFrame::from_parts(vec!["a".into()], vec![vec!["1".into()]]);
        frame.set_column("b", vec!["x".into()]);
        frame.set_column("a", vec!["9".into()]);
        assert_eq!(frame.headers(), ["a", "b"]);
        assert_eq!(frame.into_rows(), vec![vec!["9", "x"]]);
    }
}
