//! Import configurations, including presets for the TMDB exports.

use super::nested::{FlattenRule, NestedFieldSpec, DEFAULT_FIRST_N};

/// What to keep and how to normalize when importing a source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSpec {
    /// Output columns, in order. `None` keeps every source column.
    pub projection: Option<Vec<String>>,
    /// Nested columns to flatten before projecting.
    pub nested: Vec<NestedFieldSpec>,
}

impl ImportSpec {
    /// Keep every column unchanged.
    pub fn all_columns() -> Self {
        Self::default()
    }

    /// Keep only these columns, in this order.
    pub fn with_projection<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projection = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Add a nested column to flatten.
    pub fn with_nested(mut self, spec: NestedFieldSpec) -> Self {
        self.nested.push(spec);
        self
    }

    /// Preset for `tmdb_5000_movies.csv`.
    pub fn movies() -> Self {
        Self::all_columns()
            .with_projection([
                "id",
                "title",
                "genres",
                "release_date",
                "popularity",
                "vote_average",
                "vote_count",
                "runtime",
                "budget",
                "revenue",
            ])
            .with_nested(NestedFieldSpec::new("genres", FlattenRule::AllNames))
    }

    /// Preset for `tmdb_5000_credits.csv`.
    pub fn credits() -> Self {
        Self::all_columns()
            .with_projection(["movie_id", "title", "cast", "director"])
            .with_nested(NestedFieldSpec::new(
                "cast",
                FlattenRule::FirstNames(DEFAULT_FIRST_N),
            ))
            .with_nested(NestedFieldSpec::new("crew", FlattenRule::job("Director")).into_column("director"))
    }

    /// Whether a column holds flattened text.
    pub fn is_flattened(&self, column: &str) -> bool {
        self.nested.iter().any(|n| n.target == column)
    }
}
