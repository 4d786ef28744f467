use serde::de::DeserializeOwned;
use std::io::{self, Read};

/// Read a piped JSON document, e.g. an application, from stdin.
///
/// `None` when stdin is a terminal or the pipe carried only whitespace.
/// `what` names the document in error messages.
pub fn read_stdin<T: DeserializeOwned>(what: &str) -> Result<Option<T>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .map_err(|e| format!("Failed to read {what} from stdin: {e}"))?;

    Ok(parse_piped(&buffer, what)?)
}

fn parse_piped<T: DeserializeOwned>(buffer: &str, what: &str) -> Result<Option<T>, String> {
    // Files saved by some Windows editors carry a byte-order mark.
    let trimmed = buffer.trim_start_matches('\u{feff}').trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    serde_json::from_str(trimmed)
        .map(Some)
        .map_err(|e| format!("Invalid {what} JSON on stdin: {e}"))
}
