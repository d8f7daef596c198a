//! Flattening of nested list-of-object cells into delimited name strings.

use crate::literal;
use serde_json::Value as Json;

/// Default delimiter between flattened names.
pub const DEFAULT_DELIMITER: &str = ", ";

/// Default number of names kept by [`FlattenRule::FirstNames`].
pub const DEFAULT_FIRST_N: usize = 3;

/// How a decoded list of objects becomes a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlattenRule {
    /// Every `name`, in order.
    AllNames,
    /// The first N `name`s.
    FirstNames(usize),
    /// `name`s of objects whose `field` equals `equals`.
    NamesWhere { field: String, equals: String },
}

impl FlattenRule {
    /// Crew members with the given job.
    pub fn job(role: impl Into<String>) -> Self {
        FlattenRule::NamesWhere {
            field: "job".to_string(),
            equals: role.into(),
        }
    }
}

/// One nested column to decode during import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestedFieldSpec {
    /// Raw source column.
    pub source: String,
    /// Column that receives the flattened string.
    pub target: String,
    /// Flattening rule.
    pub rule: FlattenRule,
    /// Separator between names.
    pub delimiter: String,
}

impl NestedFieldSpec {
    /// Flatten `source` in place.
    pub fn new(source: impl Into<String>, rule: FlattenRule) -> Self {
        let source = source.into();
        Self {
            target: source.clone(),
            source,
            rule,
            delimiter: DEFAULT_DELIMITER.to_string(),
        }
    }

    /// Write the flattened value to a different column.
    pub fn into_column(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    /// Use a different separator.
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    /// Flatten one raw cell, or `None` when it cannot be decoded.
    pub fn flatten(&self, raw: &str) -> Option<String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Some(String::new());
        }
        let decoded = literal::parse(raw).ok()?;
        let items = decoded.as_array()?;

        let names = items.iter().filter(|item| self.selects(item)).filter_map(name_of);
        let names: Vec<&str> = match self.rule {
            FlattenRule::FirstNames(n) => names.take(n).collect(),
            _ => names.collect(),
        };
        Some(names.join(&self.delimiter))
    }

    fn selects(&self, item: &Json) -> bool {
        match &self.rule {
            FlattenRule::NamesWhere { field, equals } => {
                item.get(field).and_then(Json::as_str) == Some(equals.as_str())
            }
            FlattenRule::AllNames | FlattenRule::FirstNames(_) => true,
        }
    }
}

fn name_of(item: &Json) -> Option<&str> {
    item.get("name").and_then(Json::as_str)
}
