use serde_json::Value;

use super::{payload, scalar};

/// Key output fields, most significant first.
const PRIORITY_KEYS: [&str; 6] = [
    "outcome",
    "installment",
    "max_principal",
    "risk_grade",
    "foir",
    "product_type",
];

/// Print just the key answer value from the output.
pub fn print_minimal(value: &Value) {
    println!("{}", minimal_line(payload(value)));
}

fn minimal_line(result: &Value) -> String {
    let Value::Object(map) = result else {
        return scalar(result);
    };

    if let Some(val) = PRIORITY_KEYS
        .iter()
        .filter_map(|key| map.get(*key))
        .find(|val| !val.is_null())
    {
        return scalar(val);
    }

    // Assessments nest the grade one level down.
    if let Some(grade) = map.get("risk").and_then(|r| r.get("risk_grade")) {
        return scalar(grade);
    }

    match map.iter().next() {
        Some((key, val)) => format!("{}: {}", key, scalar(val)),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_outcome_wins() {
        let v = json!({ "risk": { "risk_grade": "B" }, "outcome": "APPROVED" });
        assert_eq!(minimal_line(&v), "APPROVED");
    }

    #[test]
    fn test_nested_grade() {
        let v = json!({ "policy_checks": [], "risk": { "risk_grade": "C" } });
        assert_eq!(minimal_line(&v), "C");
    }

    #[test]
    fn test_scalar_passthrough() {
        assert_eq!(minimal_line(&json!("8884.88")), "8884.88");
    }
}
