use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;

/// Info string used for fenced event payloads.
pub const DEFAULT_FENCE_LANG: &str = "js";

fn seam_regex() -> &'static Regex {
    static SEAM: OnceLock<Regex> = OnceLock::new();
    SEAM.get_or_init(|| {
        let pattern = format!(r"\n```\n\n?```{}\n", regex::escape(DEFAULT_FENCE_LANG));
        Regex::new(&pattern).unwrap_or_else(|e| unreachable!("seam pattern is valid: {e}"))
    })
}

/// Collapses a closing fence directly followed by a new default-language
/// opener into a single newline, merging adjacent fenced payloads.
pub fn normalize_seams(text: &str) -> Cow<'_, str> {
    seam_regex().replace_all(text, "\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjacent_blocks_merge() {
        let joined = "```js\na\n```\n```js\nb\n```";
        assert_eq!(normalize_seams(joined), "```js\na\nb\n```");
    }

    #[test]
    fn blank_line_between_blocks_merges() {
        let joined = "```js\na\n```\n\n```js\nb\n```";
        assert_eq!(normalize_seams(joined), "```js\na\nb\n```");
    }

    #[test]
    fn other_languages_untouched() {
        let joined = "```rust\na\n```\n```rust\nb\n```";
        assert_eq!(normalize_seams(joined), joined);
    }

    #[test]
    fn plain_text_borrows() {
        assert!(matches!(normalize_seams("just text"), Cow::Borrowed(_)));
    }

    #[test]
    fn many_blocks_merge_into_one() {
        let joined = ["a", "b", "c"]
            .iter()
            .map(|s| format!("```js\n{s}\n```"))
            .collect::<Vec<_>>()
            .join("\n");
        assert_eq!(normalize_seams(&joined), "```js\na\nb\nc\n```");
    }
}
