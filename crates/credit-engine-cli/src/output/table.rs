use serde_json::Value;
use tabled::{builder::Builder, Table};

use super::{flatten, payload, scalar};

/// Field/value table for the payload, followed by one table per nested
/// list of records (policy checks, similar cases, catalog entries).
pub fn print_table(value: &Value) {
    let body = payload(value);

    match body {
        Value::Array(arr) => print_records(arr),
        Value::Object(map) => {
            let mut rows = Vec::new();
            flatten("", body, &mut rows);
            if !rows.is_empty() {
                let mut builder = Builder::default();
                builder.push_record(["Field", "Value"]);
                for (key, val) in &rows {
                    builder.push_record([key.as_str(), val.as_str()]);
                }
                println!("{}", Table::from(builder));
            }

            for (key, val) in map {
                if let Value::Array(items) = val {
                    if items.iter().any(Value::is_object) {
                        println!("\n{}:", key);
                        print_records(items);
                    }
                }
            }
        }
        _ => println!("{}", scalar(body)),
    }

    if let Some(Value::Array(warnings)) = value.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }

    if let Some(Value::String(meth)) = value.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_records(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    let Some(Value::Object(first)) = arr.first() else {
        for item in arr {
            println!("{}", scalar(item));
        }
        return;
    };

    let headers: Vec<String> = first.keys().cloned().collect();
    let mut builder = Builder::default();
    builder.push_record(&headers);
    for item in arr {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(h.as_str()).map(scalar).unwrap_or_default())
                .collect();
            builder.push_record(row);
        }
    }
    println!("{}", Table::from(builder));
}
