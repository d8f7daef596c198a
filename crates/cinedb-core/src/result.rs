//! Tabular results returned to callers for display.

use crate::value::Value;
use serde::Serialize;

/// Ordered columns plus rows of values.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultSet {
    /// Column names, in statement order.
    pub columns: Vec<String>,
    /// Row values, each aligned with `columns`.
    pub rows: Vec<Vec<Value>>,
    /// Rows changed, for statements that return no columns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affected: Option<usize>,
}

impl ResultSet {
    /// Create an empty result with the given header.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
            affected: None,
        }
    }

    /// Result of a statement that changed rows but returned none.
    pub fn affected(count: usize) -> Self {
        Self {
            affected: Some(count),
            ..Self::default()
        }
    }

    /// Append a row.
    pub fn push(&mut self, row: Vec<Value>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether there are no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Iterate over the values of one column.
    pub fn column<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a Value> + 'a {
        let idx = self.column_index(name);
        self.rows.iter().filter_map(move |row| idx.map(|i| &row[i]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_lookup() {
        let mut rs = ResultSet::new(["id", "x"]);
        rs.push(vec![Value::Integer(1), Value::from("a")]);
        rs.push(vec![Value::Integer(2), Value::from("b")]);

        assert_eq!(rs.len(), 2);
        let xs: Vec<_> = rs.column("x").cloned().collect();
        assert_eq!(xs, vec![Value::from("a"), Value::from("b")]);
        assert_eq!(rs.column("missing").count(), 0);
    }

    #[test]
    fn test_affected_only() {
        let rs = ResultSet::affected(3);
        assert!(rs.is_empty());
        assert!(rs.columns.is_empty());
        assert_eq!(rs.affected, Some(3));
    }
}
