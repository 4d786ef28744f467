use serde_json::Value;
use tracing::error;

/// Pretty-print a command result, envelope included, to stdout.
pub fn print_json(value: &Value) {
    match render(value) {
        Ok(text) => println!("{text}"),
        Err(e) => error!(error = %e, "result could not be rendered as JSON"),
    }
}

/// Two-space indented JSON. Decimal amounts stay as the strings the core
/// serialises them to, so no precision is lost downstream.
fn render(value: &Value) -> serde_json::Result<String> {
    serde_json::to_string_pretty(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decision_amounts_render_verbatim() {
        let value = json!({
            "result": {
                "outcome": "CONDITIONAL_APPROVAL",
                "terms": { "amount": "712345.67", "processing_fee": "14246.91" },
            },
            "warnings": [],
        });
        let text = render(&value).unwrap();
        assert!(text.contains("\"outcome\": \"CONDITIONAL_APPROVAL\""));
        assert!(text.contains("\"amount\": \"712345.67\""));
        assert!(text.contains("\n  \"warnings\": []"));
    }
}
