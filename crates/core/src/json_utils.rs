//! Text helpers shared across crates.

/// Strip markdown code block wrappers from JSON content.
///
/// Handles `` ```json ... ``` ``, `` ``` ... ``` ``, and other language identifiers.
#[must_use]
pub fn strip_markdown_json(content: &str) -> &str {
    let trimmed = content.trim();
    if trimmed.starts_with("```") && trimmed.ends_with("```") && trimmed.len() >= 6 {
        let without_prefix = trimmed.strip_prefix("```").unwrap_or(trimmed);
        let without_suffix = without_prefix.strip_suffix("```").unwrap_or(without_prefix);
        return without_suffix
            .split_once('\n')
            .map_or_else(|| without_suffix.trim(), |(_, rest)| rest.trim());
    }
    trimmed
}

/// Truncates to at most `max_chars` characters, never splitting a char.
#[must_use]
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => s.get(..idx).unwrap_or(s),
        None => s,
    }
}

/// Collapses every run of whitespace into a single space.
#[must_use]
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_block() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_markdown_json(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_plain_block() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_markdown_json(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_no_block() {
        let input = "  {\"key\": \"value\"}\n";
        assert_eq!(strip_markdown_json(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_truncate_chars_unicode() {
        assert_eq!(truncate_chars("exercícios", 8), "exercíci");
        assert_eq!(truncate_chars("curto", 10), "curto");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a\n\n b\tc "), "a b c");
    }
}
