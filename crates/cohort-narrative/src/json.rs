//! Extraction of JSON payloads from completion text.

use regex::Regex;
use std::sync::OnceLock;

fn fenced_json() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(?s)```json\s*(.*?)\s*```").ok())
        .as_ref()
}

/// Return the body of the first ```` ```json ```` fenced block in `text`,
/// or the whole trimmed text when there is none.
pub fn extract_json(text: &str) -> &str {
    match fenced_json()
        .and_then(|re| re.captures(text))
        .and_then(|c| c.get(1))
    {
        Some(body) => body.as_str(),
        None => text.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_json() {
        assert_eq!(extract_json("  {\"a\": 1}\n"), "{\"a\": 1}");
    }

    #[test]
    fn test_fenced_json() {
        let text = "Here you go:\n```json\n{\n  \"narrative\": \"x\"\n}\n```\nAnything else?";
        assert_eq!(extract_json(text), "{\n  \"narrative\": \"x\"\n}");
    }

    #[test]
    fn test_first_fence_wins() {
        let text = "```json\n{\"a\": 1}\n```\n```json\n{\"a\": 2}\n```";
        assert_eq!(extract_json(text), "{\"a\": 1}");
    }

    #[test]
    fn test_unlabelled_fence_is_not_extracted() {
        let text = "```\n{\"a\": 1}\n```";
        assert_eq!(extract_json(text), text);
    }
}
