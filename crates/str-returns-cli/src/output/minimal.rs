use serde_json::Value;

use super::format_scalar;

/// Print just the key answer value from the output.
///
/// Looks for the headline field of each command in order of priority,
/// then falls back to the first field in the result object.
pub fn print_minimal(value: &Value) {
    // Try to extract the "result" envelope
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let priority_keys = [
        "roi_pct",
        "payback_year",
        "base_case_value",
        "allowed",
        "price",
        "zones",
    ];

    if let Value::Object(map) = result_obj {
        // Skip null values so a missing payback falls through
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}", format_scalar(val));
                    return;
                }
            }
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_scalar(val));
            return;
        }
    }

    println!("{}", format_scalar(result_obj));
}
