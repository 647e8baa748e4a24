//! Output formatters for aggregate results.

use std::collections::BTreeMap;

use clap::ValueEnum;
use comfy_table::{Cell, Table};
use relagg_core::{AggregateResult, Error, Record, Value};

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format
    Table,
    /// JSON format
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Records with their loaded aggregates, ready for display.
pub struct LoadedView<'a> {
    /// Identity attribute of the root resource.
    pub identity_field: &'a str,
    /// Requested aggregate names, in request order.
    pub names: &'a [String],
    /// Records with aggregate slots filled.
    pub records: &'a [Record],
    /// Per-aggregate failures.
    pub errors: &'a BTreeMap<String, Error>,
}

/// Trait for formatting output.
pub trait Formatter: Send + Sync {
    /// Format a standalone aggregate result.
    fn format_aggregate(&self, result: &AggregateResult) -> String;

    /// Format records with loaded aggregates.
    fn format_loaded(&self, view: &LoadedView<'_>) -> String;

    /// Format an error message.
    fn format_error(&self, error: &str) -> String;
}

/// Create a formatter for the given output format.
pub fn create_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Table => Box::new(TableFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
    }
}

/// Table formatter using comfy-table.
pub struct TableFormatter;

impl Formatter for TableFormatter {
    fn format_aggregate(&self, result: &AggregateResult) -> String {
        let mut table = Table::new();
        table.set_header(vec!["aggregate", "kind", "value"]);
        table.add_row(vec![
            Cell::new(&result.name),
            Cell::new(result.kind.name()),
            Cell::new(format_value(&result.value)),
        ]);
        table.to_string()
    }

    fn format_loaded(&self, view: &LoadedView<'_>) -> String {
        let mut table = Table::new();
        let mut headers = vec![Cell::new(view.identity_field)];
        headers.extend(view.names.iter().map(Cell::new));
        table.set_header(headers);

        for record in view.records {
            let identity = record.get(view.identity_field).unwrap_or(&Value::Null);
            let mut cells = vec![Cell::new(format_value(identity))];
            for name in view.names {
                let cell = match view.errors.get(name) {
                    Some(_) => "error".to_string(),
                    None => format_value(record.aggregate(name).unwrap_or(&Value::Null)),
                };
                cells.push(Cell::new(cell));
            }
            table.add_row(cells);
        }

        let mut output = format!("{}\n{} row(s)", table, view.records.len());
        for (name, error) in view.errors {
            output.push_str(&format!("\n{name}: {error}"));
        }
        output
    }

    fn format_error(&self, error: &str) -> String {
        format!("Error: {}", error)
    }
}

/// JSON formatter.
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format_aggregate(&self, result: &AggregateResult) -> String {
        serde_json::json!({
            "aggregate": result.name,
            "kind": result.kind.name(),
            "value": value_to_json(&result.value),
        })
        .to_string()
    }

    fn format_loaded(&self, view: &LoadedView<'_>) -> String {
        let records: Vec<serde_json::Value> = view
            .records
            .iter()
            .map(|record| {
                let mut obj = serde_json::Map::new();
                for (field, value) in &record.fields {
                    obj.insert(field.clone(), value_to_json(value));
                }
                let aggregates: serde_json::Map<String, serde_json::Value> = view
                    .names
                    .iter()
                    .filter(|name| !view.errors.contains_key(*name))
                    .map(|name| {
                        let value = record.aggregate(name).unwrap_or(&Value::Null);
                        (name.clone(), value_to_json(value))
                    })
                    .collect();
                obj.insert("aggregates".to_string(), serde_json::Value::Object(aggregates));
                serde_json::Value::Object(obj)
            })
            .collect();

        let errors: serde_json::Map<String, serde_json::Value> = view
            .errors
            .iter()
            .map(|(name, error)| (name.clone(), serde_json::Value::String(error.to_string())))
            .collect();

        serde_json::to_string_pretty(&serde_json::json!({
            "records": records,
            "errors": errors,
        }))
        .unwrap_or_else(|_| "{}".to_string())
    }

    fn format_error(&self, error: &str) -> String {
        serde_json::json!({
            "error": error
        })
        .to_string()
    }
}

/// Format a Value as a display string.
fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Convert a Value to JSON. Decimals are emitted as strings to stay exact.
fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int64(i) => serde_json::Value::Number((*i).into()),
        Value::Decimal(d) => serde_json::Value::String(d.to_string()),
        Value::String(s) => serde_json::Value::String(s.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relagg_core::AggregateKind;
    use rust_decimal::Decimal;

    fn loaded() -> (Vec<String>, Vec<Record>, BTreeMap<String, Error>) {
        let mut record = Record::from_pairs([("id", 1)]);
        record.set_aggregate("count_of_comments", Value::Int64(2));
        let mut errors = BTreeMap::new();
        errors.insert(
            "count_of_notes".to_string(),
            Error::MissingTenant {
                resource: "Note".into(),
            },
        );
        (
            vec!["count_of_comments".to_string(), "count_of_notes".to_string()],
            vec![record],
            errors,
        )
    }

    #[test]
    fn test_table_aggregate() {
        let result = AggregateResult::new("avg", AggregateKind::Avg, Value::Decimal(Decimal::new(1515, 2)));
        let output = TableFormatter.format_aggregate(&result);
        assert!(output.contains("avg"));
        assert!(output.contains("15.15"));
    }

    #[test]
    fn test_table_loaded() {
        let (names, records, errors) = loaded();
        let view = LoadedView {
            identity_field: "id",
            names: &names,
            records: &records,
            errors: &errors,
        };
        let output = TableFormatter.format_loaded(&view);
        assert!(output.contains("count_of_comments"));
        assert!(output.contains("1 row(s)"));
        assert!(output.contains("count_of_notes: "));
    }

    #[test]
    fn test_json_aggregate() {
        let result = AggregateResult::new("count", AggregateKind::Count, Value::Int64(3));
        let json: serde_json::Value =
            serde_json::from_str(&JsonFormatter.format_aggregate(&result)).unwrap();
        assert_eq!(json["value"], serde_json::json!(3));
        assert_eq!(json["kind"], serde_json::json!("count"));
    }

    #[test]
    fn test_json_loaded() {
        let (names, records, errors) = loaded();
        let view = LoadedView {
            identity_field: "id",
            names: &names,
            records: &records,
            errors: &errors,
        };
        let json: serde_json::Value =
            serde_json::from_str(&JsonFormatter.format_loaded(&view)).unwrap();
        assert_eq!(json["records"][0]["id"], serde_json::json!(1));
        assert_eq!(
            json["records"][0]["aggregates"]["count_of_comments"],
            serde_json::json!(2)
        );
        assert!(json["records"][0]["aggregates"].get("count_of_notes").is_none());
        assert!(json["errors"]["count_of_notes"].is_string());
    }

    #[test]
    fn test_decimal_stays_exact_in_json() {
        assert_eq!(
            value_to_json(&Value::Decimal(Decimal::new(3030, 2))),
            serde_json::json!("30.30")
        );
        assert_eq!(value_to_json(&Value::Null), serde_json::Value::Null);
    }
}
