use serde_json::Value;
use std::io;

use super::{flatten, payload, scalar};

/// Write output as CSV to stdout. Objects become `field,value` rows with
/// dotted keys; arrays of records become one row per record.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match payload(value) {
        Value::Array(arr) => write_records(&mut wtr, arr),
        body @ Value::Object(_) => {
            let mut rows = Vec::new();
            flatten("", body, &mut rows);
            let _ = wtr.write_record(["field", "value"]);
            for (key, val) in &rows {
                let _ = wtr.write_record([key.as_str(), val.as_str()]);
            }
        }
        other => {
            let _ = wtr.write_record([scalar(other)]);
        }
    }

    let _ = wtr.flush();
}

fn write_records(wtr: &mut csv::Writer<io::StdoutLock<'_>>, arr: &[Value]) {
    let Some(Value::Object(first)) = arr.first() else {
        for item in arr {
            let _ = wtr.write_record([scalar(item)]);
        }
        return;
    };

    let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
    let _ = wtr.write_record(&headers);
    for item in arr {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(scalar).unwrap_or_default())
                .collect();
            let _ = wtr.write_record(&row);
        }
    }
}
