//! Word counting for essay drafts

/// Minimum number of words an essay needs before it can be checked
pub const MIN_WORDS: usize = 150;

/// Count whitespace-separated words
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Words still missing before `text` reaches [`MIN_WORDS`]
pub fn words_needed(text: &str) -> usize {
    MIN_WORDS.saturating_sub(word_count(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_count_collapses_whitespace() {
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("   \n\t "), 0);
        assert_eq!(word_count("  The chart   shows\nthree\ttrends. "), 5);
    }

    #[test]
    fn test_words_needed() {
        assert_eq!(words_needed("one two"), 148);
        let long = "word ".repeat(200);
        assert_eq!(words_needed(&long), 0);
    }
}
