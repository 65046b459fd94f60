use crate::error::Result;
use serde_json::Value;
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use tracing::debug;

pub fn load_file(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)?;
    debug!(path = %path.display(), bytes = content.len(), "read snapshot");
    parse(&content)
}

pub fn load_stdin() -> Result<Value> {
    let mut content = String::new();
    io::stdin().lock().read_to_string(&mut content)?;
    debug!(bytes = content.len(), "read snapshot from stdin");
    parse(&content)
}

/// The upstream export embeds literal `\n` escapes that are not valid inside
/// its JSON strings, so they are dropped before parsing.
pub fn parse(content: &str) -> Result<Value> {
    let cleaned = content.replace("\\n", "");
    Ok(serde_json::from_str(&cleaned)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_strips_escaped_newlines() {
        let content = r#"{"row": [{"StartDate": "03/05/2024", "Title": "Open\n House"}]}"#;
        let value = parse(content).unwrap();
        assert_eq!(value["row"][0]["Title"], "Open House");
    }

    #[test]
    fn test_real_newlines_are_kept_as_whitespace() {
        let content = "{\n  \"row\": []\n}";
        assert_eq!(parse(content).unwrap()["row"], serde_json::json!([]));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(parse("{\"row\": ["), Err(Error::Json(_))));
    }

    #[test]
    fn test_missing_file() {
        let err = load_file(Path::new("/nonexistent/slateq/snapshot.json")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
