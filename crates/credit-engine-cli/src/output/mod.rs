pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// The payload of a `with_metadata` envelope, or the value itself.
pub(crate) fn payload(value: &Value) -> &Value {
    value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value)
}

/// Flatten nested objects into dotted keys; arrays of scalars are joined.
/// Arrays of objects are left out and rendered separately by callers.
pub(crate) fn flatten(prefix: &str, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (key, val) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten(&path, val, out);
            }
        }
        Value::Array(items) if items.iter().any(Value::is_object) => {}
        _ => out.push((prefix.to_string(), scalar(value))),
    }
}

pub(crate) fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(arr) => arr.iter().map(scalar).collect::<Vec<_>>().join("; "),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_nested_decision() {
        let value = json!({
            "outcome": "APPROVED",
            "terms": { "amount": "100000", "tenure_months": 36 },
            "conditions": ["a", "b"],
            "policy_checks": [{ "rule": "HARD_AGE_MIN" }],
        });
        let mut rows = Vec::new();
        flatten("", &value, &mut rows);

        assert!(rows.contains(&("outcome".into(), "APPROVED".into())));
        assert!(rows.contains(&("terms.amount".into(), "100000".into())));
        assert!(rows.contains(&("terms.tenure_months".into(), "36".into())));
        assert!(rows.contains(&("conditions".into(), "a; b".into())));
        assert!(rows.iter().all(|(k, _)| k != "policy_checks"));
    }
}
