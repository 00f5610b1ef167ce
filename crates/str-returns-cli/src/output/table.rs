use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{flatten_rows, format_scalar, grid_rows};

/// Format output as a table using the tabled crate.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result_table(result, map);
            } else {
                print_envelope_free(map);
            }
        }
        Value::Array(arr) => {
            print_array_table(arr);
        }
        _ => {
            println!("{}", value);
        }
    }
}

fn print_result_table(result: &Value, envelope: &Map<String, Value>) {
    if let Value::Object(res_map) = result {
        if let Some(grid) = grid_rows(res_map) {
            let mut builder = Builder::default();
            for row in grid {
                builder.push_record(row);
            }
            println!("{}", Table::from(builder));
        } else {
            print_field_table(res_map);
        }

        // Break-even trajectory of a simulation
        if let Some(Value::Array(series)) = res_map.get("break_even_series") {
            println!("\nBreak-even series:");
            print_array_table(series);
        }
    } else {
        println!("{}", format_scalar(result));
    }

    print_warnings(envelope);

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

/// Outputs without the computation envelope (break-even rows, zone lists).
fn print_envelope_free(map: &Map<String, Value>) {
    let scalars: Map<String, Value> = map
        .iter()
        .filter(|(k, _)| k.as_str() != "results" && k.as_str() != "warnings")
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    print_field_table(&scalars);

    if let Some(Value::Array(results)) = map.get("results") {
        println!();
        print_array_table(results);
    }

    print_warnings(map);
}

fn print_field_table(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in flatten_rows(map) {
        builder.push_record([key, val]);
    }
    println!("{}", Table::from(builder));
}

fn print_warnings(map: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = map.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    // Collect all keys from first object for headers
    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(headers.clone());

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_scalar).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }

        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", format_scalar(item));
        }
    }
}
