//! Output formatters for result sets.

use cinedb_core::{ResultSet, Value};
use clap::ValueEnum;
use comfy_table::{Cell, Table};

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format
    Table,
    /// JSON format
    Json,
    /// CSV format
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(format!("Unknown format '{}'. Use: table, json, csv", other)),
        }
    }
}

/// Trait for formatting output.
pub trait Formatter {
    /// Format rows returned by a query.
    fn format_result(&self, result: &ResultSet) -> String;

    /// Format the outcome of a write.
    fn format_affected(&self, affected: usize, message: &str) -> String;

    /// Format an error message.
    fn format_error(&self, error: &str) -> String;

    /// Format a simple message.
    fn format_message(&self, message: &str) -> String;
}

/// Create a formatter for the given output format.
pub fn create_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Table => Box::new(TableFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
        OutputFormat::Csv => Box::new(CsvFormatter),
    }
}

/// Table formatter using comfy-table.
pub struct TableFormatter;

impl Formatter for TableFormatter {
    fn format_result(&self, result: &ResultSet) -> String {
        if result.columns.is_empty() {
            return "No results".to_string();
        }

        let mut table = Table::new();
        table.set_header(result.columns.iter().map(Cell::new));
        for row in &result.rows {
            table.add_row(row.iter().map(|v| Cell::new(v.to_string())));
        }

        format!("{}\n{} row(s)", table, result.len())
    }

    fn format_affected(&self, affected: usize, message: &str) -> String {
        if message.is_empty() {
            format!("{} row(s) affected", affected)
        } else {
            format!("{} row(s) affected: {}", affected, message)
        }
    }

    fn format_error(&self, error: &str) -> String {
        format!("Error: {}", error)
    }

    fn format_message(&self, message: &str) -> String {
        message.to_string()
    }
}

/// JSON formatter.
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format_result(&self, result: &ResultSet) -> String {
        let rows: Vec<serde_json::Value> = result
            .rows
            .iter()
            .map(|row| {
                let obj: serde_json::Map<String, serde_json::Value> = result
                    .columns
                    .iter()
                    .cloned()
                    .zip(row.iter().map(value_to_json))
                    .collect();
                serde_json::Value::Object(obj)
            })
            .collect();
        serde_json::to_string_pretty(&rows).unwrap_or_else(|_| "[]".to_string())
    }

    fn format_affected(&self, affected: usize, message: &str) -> String {
        serde_json::json!({
            "affected": affected,
            "message": message
        })
        .to_string()
    }

    fn format_error(&self, error: &str) -> String {
        serde_json::json!({
            "error": error
        })
        .to_string()
    }

    fn format_message(&self, message: &str) -> String {
        serde_json::json!({
            "message": message
        })
        .to_string()
    }
}

/// CSV formatter.
pub struct CsvFormatter;

impl Formatter for CsvFormatter {
    fn format_result(&self, result: &ResultSet) -> String {
        let mut writer = csv::Writer::from_writer(Vec::new());
        let mut write = || -> Result<Vec<u8>, Box<dyn std::error::Error>> {
            writer.write_record(&result.columns)?;
            for row in &result.rows {
                writer.write_record(row.iter().map(format_value_csv))?;
            }
            writer.flush()?;
            Ok(writer.get_ref().clone())
        };
        match write() {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => self.format_error(&e.to_string()),
        }
    }

    fn format_affected(&self, affected: usize, message: &str) -> String {
        format!("affected,message\n{},\"{}\"", affected, escape_csv(message))
    }

    fn format_error(&self, error: &str) -> String {
        format!("error\n\"{}\"", escape_csv(error))
    }

    fn format_message(&self, message: &str) -> String {
        message.to_string()
    }
}

/// Format a Value for CSV output.
fn format_value_csv(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Convert a Value to JSON.
fn value_to_json(value: &Value) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or(serde_json::Value::Null)
}

/// Escape a string for CSV.
fn escape_csv(s: &str) -> String {
    s.replace('"', "\"\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ResultSet {
        let mut rs = ResultSet::new(["id", "title", "runtime"]);
        rs.push(vec![Value::Integer(1), Value::from("Up, again"), Value::Null]);
        rs
    }

    #[test]
    fn test_table_output() {
        let out = TableFormatter.format_result(&sample());
        assert!(out.contains("title"));
        assert!(out.contains("Up, again"));
        assert!(out.contains("NULL"));
        assert!(out.ends_with("1 row(s)"));
        assert_eq!(TableFormatter.format_result(&ResultSet::default()), "No results");
    }

    #[test]
    fn test_json_keeps_column_order() {
        let out = JsonFormatter.format_result(&sample());
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed[0]["id"], 1);
        assert_eq!(parsed[0]["runtime"], serde_json::Value::Null);
        let keys: Vec<_> = parsed[0].as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["id", "title", "runtime"]);
    }

    #[test]
    fn test_csv_quotes_delimiters() {
        let out = CsvFormatter.format_result(&sample());
        assert_eq!(out, "id,title,runtime\n1,\"Up, again\",\n");
    }

    #[test]
    fn test_escape_csv() {
        assert_eq!(escape_csv("hello"), "hello");
        assert_eq!(escape_csv("say \"hi\""), "say \"\"hi\"\"");
    }

    #[test]
    fn test_parse_format() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("xml".parse::<OutputFormat>().is_err());
    }
}
