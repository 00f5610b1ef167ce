pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Flatten nested objects into dotted `field, value` rows
/// (`costs.cleaning`). Arrays of objects collapse to a row count; they are
/// printed as their own table where a formatter supports it.
pub fn flatten_rows(map: &Map<String, Value>) -> Vec<(String, String)> {
    let mut rows = Vec::new();
    push_rows("", map, &mut rows);
    rows
}

fn push_rows(prefix: &str, map: &Map<String, Value>, rows: &mut Vec<(String, String)>) {
    for (key, val) in map {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match val {
            Value::Object(inner) => push_rows(&name, inner, rows),
            Value::Array(items) if items.iter().any(Value::is_object) => {
                rows.push((name, format!("[{} rows]", items.len())));
            }
            _ => rows.push((name, format_scalar(val))),
        }
    }
}

/// Render a JSON value as a single cell.
pub fn format_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(arr) => arr.iter().map(format_scalar).collect::<Vec<_>>().join(", "),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

/// The sensitivity grid as a header row plus one row per occupancy value.
pub fn grid_rows(result: &Map<String, Value>) -> Option<Vec<Vec<String>>> {
    let rows_axis = result.get("occupancy_values")?.as_array()?;
    let cols_axis = result.get("nightly_rate_values")?.as_array()?;
    let matrix = result.get("matrix")?.as_array()?;

    let mut header = vec!["occupancy_pct \\ nightly_rate".to_string()];
    header.extend(cols_axis.iter().map(format_scalar));

    let mut rows = vec![header];
    for (occupancy, cells) in rows_axis.iter().zip(matrix) {
        let mut row = vec![format_scalar(occupancy)];
        if let Some(cells) = cells.as_array() {
            row.extend(cells.iter().map(format_scalar));
        }
        rows.push(row);
    }
    Some(rows)
}
