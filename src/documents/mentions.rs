use std::collections::BTreeSet;

use lazy_static::lazy_static;
use regex::Regex;

/// Usernames mentioned as `@name` in `content`, deduplicated and sorted.
pub fn extract_mentions(content: &str) -> BTreeSet<String> {
    lazy_static! {
        static ref MENTION_RE: Regex = Regex::new(r"@(\w+)").unwrap();
    }
    MENTION_RE
        .captures_iter(content)
        .map(|c| c[1].to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(content: &str) -> Vec<String> {
        extract_mentions(content).into_iter().collect()
    }

    #[test]
    fn finds_and_dedups_mentions() {
        assert_eq!(
            names("hey @bob, see @carol_2 and @bob again"),
            vec!["bob", "carol_2"]
        );
    }

    #[test]
    fn stops_at_non_word_characters() {
        assert_eq!(names("(@dave) @erin! @frank-smith"), vec!["dave", "erin", "frank"]);
    }

    #[test]
    fn bare_at_signs_are_ignored() {
        assert!(extract_mentions("no mentions @ all, @@ or @").is_empty());
        assert!(extract_mentions("").is_empty());
    }
}
