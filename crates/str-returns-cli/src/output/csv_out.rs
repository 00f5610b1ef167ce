use serde_json::Value;
use std::io;

use super::{flatten_rows, format_scalar, grid_rows};

/// Write output as CSV to stdout.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match value {
        Value::Object(map) => {
            if let Some(Value::Object(result)) = map.get("result") {
                if let Some(grid) = grid_rows(result) {
                    for row in grid {
                        let _ = wtr.write_record(&row);
                    }
                } else {
                    // Two-column CSV: field, value
                    let _ = wtr.write_record(["field", "value"]);
                    for (key, val) in flatten_rows(result) {
                        let _ = wtr.write_record([key.as_str(), val.as_str()]);
                    }
                }
            } else if let Some(Value::Array(results)) = map.get("results") {
                // Break-even series
                write_array_csv(&mut wtr, results);
            } else {
                let _ = wtr.write_record(["field", "value"]);
                for (key, val) in flatten_rows(map) {
                    let _ = wtr.write_record([key.as_str(), val.as_str()]);
                }
            }
        }
        Value::Array(arr) => {
            write_array_csv(&mut wtr, arr);
        }
        _ => {
            let _ = wtr.write_record([&format_scalar(value)]);
        }
    }

    let _ = wtr.flush();
}

fn write_array_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, arr: &[Value]) {
    if arr.is_empty() {
        return;
    }

    // Extract headers from first object
    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(format_scalar).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([&format_scalar(item)]);
        }
    }
}
