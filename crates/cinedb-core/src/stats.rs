//! Summary statistics over imported tables.
//!
//! These are the numbers behind the dataset's usual charts (budget and
//! revenue distributions, genre counts, releases per year and so on),
//! returned as result sets for text display.

use crate::catalog::{quote_ident, Catalog};
use crate::editor::collect_rows;
use crate::error::{Error, Result};
use crate::import::DEFAULT_DELIMITER;
use crate::result::ResultSet;
use crate::value::Value;
use chrono::{Datelike, NaiveDate};
use rusqlite::Connection;
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

/// Default number of histogram bins.
pub const DEFAULT_BINS: usize = 30;

/// Upper bound on histogram bins.
pub const MAX_BINS: usize = 1000;

/// Statistics over one connection.
pub struct Stats<'conn> {
    conn: &'conn Connection,
}

impl<'conn> Stats<'conn> {
    /// Create a statistics view over the connection.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Values of the given columns, after checking them against the catalog.
    fn select(&self, table: &str, columns: &[&str]) -> Result<ResultSet> {
        let catalog = Catalog::new(self.conn);
        let table = catalog.resolve_table(table)?;
        let resolved = columns
            .iter()
            .map(|c| catalog.resolve_column(&table, c).map(|c| quote_ident(&c)))
            .collect::<Result<Vec<_>>>()?;
        let sql = format!("SELECT {} FROM {}", resolved.join(", "), quote_ident(&table));
        let mut stmt = self.conn.prepare(&sql)?;
        Ok(collect_rows(&mut stmt, [])?)
    }

    /// How many rows mention each name in a delimited column, most common first.
    pub fn genre_counts(&self, table: &str, column: &str, delimiter: &str) -> Result<ResultSet> {
        let data = self.select(table, &[column])?;
        let mut counts: HashMap<String, i64> = HashMap::new();
        for row in &data.rows {
            for genre in split_names(&row[0], delimiter) {
                *counts.entry(genre).or_default() += 1;
            }
        }

        let mut counts: Vec<_> = counts.into_iter().collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let mut result = ResultSet::new(["genre", "count"]);
        for (genre, count) in counts {
            result.push(vec![Value::Text(genre), Value::Integer(count)]);
        }
        Ok(result)
    }

    /// Mean of a numeric column per name in a delimited column, highest first.
    pub fn average_by_genre(
        &self,
        table: &str,
        genre_column: &str,
        value_column: &str,
        delimiter: &str,
    ) -> Result<ResultSet> {
        let data = self.select(table, &[genre_column, value_column])?;
        let mut sums: HashMap<String, (f64, i64)> = HashMap::new();
        for row in &data.rows {
            let Some(value) = row[1].as_f64() else {
                continue;
            };
            for genre in split_names(&row[0], delimiter) {
                let entry = sums.entry(genre).or_insert((0.0, 0));
                entry.0 += value;
                entry.1 += 1;
            }
        }

        let mut averages: Vec<(String, f64, i64)> = sums
            .into_iter()
            .map(|(genre, (sum, n))| (genre, sum / n as f64, n))
            .collect();
        averages.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let mut result = ResultSet::new(["genre", "average", "rows"]);
        for (genre, average, n) in averages {
            result.push(vec![
                Value::Text(genre),
                Value::Real(round2(average)),
                Value::Integer(n),
            ]);
        }
        Ok(result)
    }

    /// Rows per calendar year of a `YYYY-MM-DD` date column; bad dates are skipped.
    pub fn releases_per_year(&self, table: &str, date_column: &str) -> Result<ResultSet> {
        let data = self.select(table, &[date_column])?;
        let mut years: BTreeMap<i32, i64> = BTreeMap::new();
        let mut skipped = 0usize;
        for row in &data.rows {
            match row[0].as_text().as_deref().and_then(parse_year) {
                Some(year) => *years.entry(year).or_default() += 1,
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            tracing::debug!(table, column = date_column, skipped, "rows without a usable date");
        }

        let mut result = ResultSet::new(["year", "count"]);
        for (year, count) in years {
            result.push(vec![Value::Integer(i64::from(year)), Value::Integer(count)]);
        }
        Ok(result)
    }

    /// The `n` rows with the largest `order_column`, labelled by `label_column`.
    pub fn top_by(
        &self,
        table: &str,
        order_column: &str,
        label_column: &str,
        n: usize,
    ) -> Result<ResultSet> {
        let catalog = Catalog::new(self.conn);
        let table = catalog.resolve_table(table)?;
        let order = catalog.resolve_column(&table, order_column)?;
        let label = catalog.resolve_column(&table, label_column)?;

        let sql = format!(
            "SELECT {label}, {order} FROM {table} WHERE {order} IS NOT NULL ORDER BY {order} DESC LIMIT ?1",
            label = quote_ident(&label),
            order = quote_ident(&order),
            table = quote_ident(&table),
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let limit = i64::try_from(n).unwrap_or(i64::MAX);
        Ok(collect_rows(&mut stmt, [limit])?)
    }

    /// Equal-width histogram of a numeric column.
    ///
    /// Non-numeric cells are dropped. With `positive_only`, so are values <= 0
    /// (zero budgets and revenues mean "unknown" in the movie export).
    pub fn histogram(
        &self,
        table: &str,
        column: &str,
        bins: usize,
        positive_only: bool,
    ) -> Result<ResultSet> {
        if bins == 0 {
            return Err(Error::InvalidInput("histogram needs at least one bin".to_string()));
        }
        if bins > MAX_BINS {
            return Err(Error::InvalidInput(format!(
                "histogram supports at most {} bins, got {}",
                MAX_BINS, bins
            )));
        }
        let data = self.select(table, &[column])?;
        let values: Vec<f64> = data
            .rows
            .iter()
            .filter_map(|row| row[0].as_f64())
            .filter(|v| !positive_only || *v > 0.0)
            .collect();
        Ok(bin_values(&values, bins))
    }
}

/// Canned reports over the movies table produced by the movies import preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovieReport {
    Genres,
    RatingByGenre,
    PerYear,
    TopVotes,
    Budget,
    Revenue,
    Runtime,
    Popularity,
}

impl MovieReport {
    /// Every report, in menu order.
    pub const ALL: [MovieReport; 8] = [
        MovieReport::Budget,
        MovieReport::Revenue,
        MovieReport::Runtime,
        MovieReport::Genres,
        MovieReport::RatingByGenre,
        MovieReport::PerYear,
        MovieReport::TopVotes,
        MovieReport::Popularity,
    ];

    /// Command name of the report.
    pub fn name(self) -> &'static str {
        match self {
            MovieReport::Genres => "genres",
            MovieReport::RatingByGenre => "rating-by-genre",
            MovieReport::PerYear => "per-year",
            MovieReport::TopVotes => "top-votes",
            MovieReport::Budget => "budget",
            MovieReport::Revenue => "revenue",
            MovieReport::Runtime => "runtime",
            MovieReport::Popularity => "popularity",
        }
    }

    /// One-line description.
    pub fn title(self) -> &'static str {
        match self {
            MovieReport::Genres => "Top genres",
            MovieReport::RatingByGenre => "Average rating by genre",
            MovieReport::PerYear => "Movies released per year",
            MovieReport::TopVotes => "Top 10 movies by vote count",
            MovieReport::Budget => "Distribution of movie budgets",
            MovieReport::Revenue => "Distribution of movie revenues",
            MovieReport::Runtime => "Distribution of runtimes",
            MovieReport::Popularity => "Distribution of popularity",
        }
    }

    /// Compute the report over `table`.
    pub fn run(self, stats: &Stats<'_>, table: &str) -> Result<ResultSet> {
        match self {
            MovieReport::Genres => stats.genre_counts(table, "genres", DEFAULT_DELIMITER),
            MovieReport::RatingByGenre => {
                stats.average_by_genre(table, "genres", "vote_average", DEFAULT_DELIMITER)
            }
            MovieReport::PerYear => stats.releases_per_year(table, "release_date"),
            MovieReport::TopVotes => stats.top_by(table, "vote_count", "title", 10),
            MovieReport::Budget => stats.histogram(table, "budget", DEFAULT_BINS, true),
            MovieReport::Revenue => stats.histogram(table, "revenue", DEFAULT_BINS, true),
            MovieReport::Runtime => stats.histogram(table, "runtime", DEFAULT_BINS, false),
            MovieReport::Popularity => stats.histogram(table, "popularity", DEFAULT_BINS, false),
        }
    }
}

impl FromStr for MovieReport {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().to_ascii_lowercase();
        MovieReport::ALL
            .into_iter()
            .find(|r| r.name() == s)
            .ok_or_else(|| {
                let names: Vec<_> = MovieReport::ALL.iter().map(|r| r.name()).collect();
                Error::InvalidInput(format!(
                    "unknown report '{}'; expected one of: {}",
                    s,
                    names.join(", ")
                ))
            })
    }
}

fn split_names(cell: &Value, delimiter: &str) -> Vec<String> {
    let Some(text) = cell.as_text() else {
        return Vec::new();
    };
    let delimiter = match delimiter.trim() {
        "" => delimiter,
        trimmed => trimmed,
    };
    text.split(delimiter)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_year(raw: &str) -> Option<i32> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%m/%d/%Y"))
        .map(|d| d.year())
        .ok()
}

fn bin_values(values: &[f64], bins: usize) -> ResultSet {
    let mut result = ResultSet::new(["bin_start", "bin_end", "count"]);
    let (Some(min), Some(max)) = (
        values.iter().copied().reduce(f64::min),
        values.iter().copied().reduce(f64::max),
    ) else {
        return result;
    };

    let width = if max > min { (max - min) / bins as f64 } else { 1.0 };
    let bins = if max > min { bins } else { 1 };
    let mut counts = vec![0i64; bins];
    for v in values {
        let idx = (((v - min) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }

    for (i, count) in counts.into_iter().enumerate() {
        let start = min + width * i as f64;
        result.push(vec![
            Value::Real(round2(start)),
            Value::Real(round2(start + width)),
            Value::Integer(count),
        ]);
    }
    result
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE movies (title TEXT, genres TEXT, vote_average REAL, vote_count INTEGER,
                                  release_date TEXT, budget INTEGER);
             INSERT INTO movies VALUES
                ('Avatar', 'Action, Adventure', 7.2, 11800, '2009-12-10', 237000000),
                ('Spectre', 'Action, Crime', 6.3, 4466, '2015-10-26', 245000000),
                ('Amelie', 'Comedy', 7.8, 3310, '2001-04-25', 0),
                ('Lost', '', NULL, NULL, '', NULL);",
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_genre_counts() {
        let conn = setup();
        let rs = Stats::new(&conn)
            .genre_counts("movies", "genres", DEFAULT_DELIMITER)
            .unwrap();
        assert_eq!(rs.columns, vec!["genre", "count"]);
        assert_eq!(rs.rows[0], vec![Value::from("Action"), Value::Integer(2)]);
        assert_eq!(rs.len(), 4);
    }

    #[test]
    fn test_average_by_genre() {
        let conn = setup();
        let rs = Stats::new(&conn)
            .average_by_genre("movies", "genres", "vote_average", DEFAULT_DELIMITER)
            .unwrap();
        let action = rs
            .rows
            .iter()
            .find(|r| r[0] == Value::from("Action"))
            .unwrap();
        assert_eq!(action[1], Value::Real(6.75));
        assert_eq!(rs.rows[0][0], Value::from("Comedy"));
    }

    #[test]
    fn test_releases_per_year_skips_bad_dates() {
        let conn = setup();
        let rs = Stats::new(&conn).releases_per_year("movies", "release_date").unwrap();
        let years: Vec<_> = rs.rows.iter().map(|r| r[0].clone()).collect();
        assert_eq!(
            years,
            vec![Value::Integer(2001), Value::Integer(2009), Value::Integer(2015)]
        );
    }

    #[test]
    fn test_top_by() {
        let conn = setup();
        let rs = MovieReport::TopVotes.run(&Stats::new(&conn), "movies").unwrap();
        assert_eq!(rs.columns, vec!["title", "vote_count"]);
        assert_eq!(rs.len(), 3);
        assert_eq!(rs.rows[0][0], Value::from("Avatar"));
    }

    #[test]
    fn test_histogram_positive_only() {
        let conn = setup();
        let stats = Stats::new(&conn);
        let rs = stats.histogram("movies", "budget", 2, true).unwrap();
        let total: i64 = rs
            .rows
            .iter()
            .map(|r| match r[2] {
                Value::Integer(n) => n,
                _ => 0,
            })
            .sum();
        assert_eq!(total, 2);
        assert!(stats.histogram("movies", "budget", 0, true).is_err());
        assert!(stats.histogram("movies", "budget", MAX_BINS, true).is_ok());
        assert!(matches!(
            stats.histogram("movies", "budget", usize::MAX / 4, true),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_bin_values_edges() {
        assert!(bin_values(&[], 5).is_empty());
        let single = bin_values(&[4.0, 4.0], 5);
        assert_eq!(single.len(), 1);
        assert_eq!(single.rows[0][2], Value::Integer(2));

        let spread = bin_values(&[0.0, 5.0, 10.0], 2);
        assert_eq!(spread.rows[0][2], Value::Integer(1));
        assert_eq!(spread.rows[1][2], Value::Integer(2));
    }

    #[test]
    fn test_unknown_column() {
        let conn = setup();
        assert!(matches!(
            Stats::new(&conn).genre_counts("movies", "nope", ","),
            Err(Error::UnknownColumn { .. })
        ));
    }

    #[test]
    fn test_report_names() {
        for report in MovieReport::ALL {
            assert_eq!(report.name().parse::<MovieReport>().unwrap(), report);
        }
        assert!("plot".parse::<MovieReport>().is_err());
    }
}
