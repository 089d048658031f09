//! Prompt autocomplete and starter suggestions

use rand::seq::SliceRandom;

/// Phrases offered by autocomplete
pub const COMMON_PHRASES: [&str; 10] = [
    "How can I",
    "What is",
    "Explain to me",
    "Give me an example of",
    "What is the difference between",
    "How would I go about",
    "Can you",
    "I want to",
    "Help me with",
    "Write me",
];

/// Starter prompts grouped by category
pub const PROGRAMMING: [&str; 5] = [
    "Explain the concept of",
    "Write code for",
    "How do I",
    "What is the difference between",
    "Fix this error:",
];

pub const GENERAL: [&str; 5] = [
    "Write an article about",
    "Summarize",
    "Translate into",
    "Make a list of",
    "Suggest ideas for",
];

pub const CREATIVE: [&str; 5] = [
    "Write a story about",
    "Design a",
    "Draft a script for",
    "Come up with an idea for",
    "Suggest titles for",
];

/// Autocomplete candidates for `input`
///
/// Only inputs longer than two characters get candidates; matching is a
/// case-sensitive prefix match.
///
/// # Examples
///
/// ```
/// use quillchat::suggest::complete;
///
/// assert_eq!(complete("Wh"), Vec::<&str>::new());
/// assert_eq!(complete("What"), vec!["What is", "What is the difference between"]);
/// ```
pub fn complete(input: &str) -> Vec<&'static str> {
    if input.chars().count() <= 2 {
        return Vec::new();
    }
    COMMON_PHRASES
        .iter()
        .copied()
        .filter(|phrase| phrase.starts_with(input))
        .collect()
}

/// Up to `count` distinct starter prompts in random order
pub fn random_suggestions(count: usize) -> Vec<&'static str> {
    let mut all: Vec<&'static str> = PROGRAMMING
        .iter()
        .chain(GENERAL.iter())
        .chain(CREATIVE.iter())
        .copied()
        .collect();
    all.sort_unstable();
    all.dedup();
    all.shuffle(&mut rand::rng());
    all.truncate(count);
    all
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_complete_requires_three_chars() {
        assert!(complete("").is_empty());
        assert!(complete("Ho").is_empty());
        assert_eq!(complete("How"), vec!["How can I", "How would I go about"]);
    }

    #[test]
    fn test_complete_no_match() {
        assert!(complete("Zebra").is_empty());
    }

    #[test]
    fn test_random_suggestions_are_distinct_and_bounded() {
        let picks = random_suggestions(5);
        assert_eq!(picks.len(), 5);
        let unique: HashSet<_> = picks.iter().collect();
        assert_eq!(unique.len(), 5);
    }

    #[test]
    fn test_random_suggestions_caps_at_pool_size() {
        assert_eq!(random_suggestions(100).len(), 15);
    }
}
