//! Tolerant JSON extraction from LLM chat completions, which routinely wrap
//! their JSON answer in a fenced code block or pad it with leading/trailing
//! prose despite being asked not to.

use serde::de::DeserializeOwned;
use serde_json::Result as JsonResult;

/// Parse `text` as `T`, first stripping a ` ```json ... ``` ` / ` ``` ... ``` `
/// fence if present, then falling back to the outermost `{...}` span if the
/// whole trimmed string still doesn't parse on its own.
pub fn parse_tolerant<T: DeserializeOwned>(text: &str) -> JsonResult<T> {
    let candidate = unfence(text);

    match serde_json::from_str(candidate) {
        Ok(value) => Ok(value),
        Err(err) => match outermost_object(candidate) {
            Some(object) => serde_json::from_str(object),
            None => Err(err),
        },
    }
}

fn unfence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(after_open) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let after_open = after_open.strip_prefix("json").unwrap_or(after_open);
    let after_open = after_open.trim_start_matches(['\n', '\r']);
    match after_open.rfind("```") {
        Some(end) => after_open[..end].trim(),
        None => after_open.trim(),
    }
}

fn outermost_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end >= start).then(|| &text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize, PartialEq, Debug)]
    struct Verdict {
        relevant: bool,
        score: f64,
    }

    #[test]
    fn parses_bare_json() {
        let v: Verdict = parse_tolerant(r#"{"relevant": true, "score": 0.5}"#).unwrap();
        assert_eq!(v, Verdict { relevant: true, score: 0.5 });
    }

    #[test]
    fn strips_json_fence() {
        let text = "```json\n{\"relevant\": false, \"score\": 0.0}\n```";
        let v: Verdict = parse_tolerant(text).unwrap();
        assert_eq!(v, Verdict { relevant: false, score: 0.0 });
    }

    #[test]
    fn strips_bare_fence_without_language_tag() {
        let text = "```\n{\"relevant\": true, \"score\": 1.0}\n```";
        let v: Verdict = parse_tolerant(text).unwrap();
        assert_eq!(v, Verdict { relevant: true, score: 1.0 });
    }

    #[test]
    fn recovers_json_surrounded_by_prose() {
        let text = "Sure, here is the analysis:\n{\"relevant\": true, \"score\": 0.2}\nHope that helps!";
        let v: Verdict = parse_tolerant(text).unwrap();
        assert_eq!(v, Verdict { relevant: true, score: 0.2 });
    }
}
