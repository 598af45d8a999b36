use std::collections::HashSet;

/// Tokens must be strictly longer than this.
pub const MIN_EXCLUSIVE_LEN: usize = 2;
/// Tokens must be strictly shorter than this.
pub const MAX_EXCLUSIVE_LEN: usize = 15;

/// Function words dropped by the word cloud.
pub const DEFAULT_STOP_WORDS: &[&str] = &[
    "the", "and", "a", "an", "in", "on", "at", "to", "for", "of", "with", "by", "is", "was",
    "were", "are", "that", "this", "these", "those", "it", "they", "them", "their", "from", "have",
    "had", "has",
];

/// Suffixes that mark a token as a likely verb form or adverb.
pub const DEFAULT_REJECTED_SUFFIXES: &[&str] = &["ing", "ed", "ly"];

/// Immutable stop-word set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StopWords(HashSet<String>);

impl StopWords {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(words.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, word: &str) -> bool {
        self.0.contains(word)
    }
}

/// Rough part-of-speech filter: stop words plus a suffix blacklist.
/// It is a heuristic: "bed" and "need" are rejected along with "tasted".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordFilter {
    stop_words: StopWords,
    rejected_suffixes: Vec<String>,
}

impl WordFilter {
    pub fn new(stop_words: StopWords, rejected_suffixes: Vec<String>) -> Self {
        Self {
            stop_words,
            rejected_suffixes,
        }
    }

    pub fn accepts(&self, word: &str) -> bool {
        !self.stop_words.contains(word)
            && !self
                .rejected_suffixes
                .iter()
                .any(|suffix| word.ends_with(suffix.as_str()))
    }
}

impl Default for WordFilter {
    fn default() -> Self {
        Self::new(
            StopWords::new(DEFAULT_STOP_WORDS.iter().copied()),
            DEFAULT_REJECTED_SUFFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
    }
}

/// Splits review text into lowercase ASCII words.
#[derive(Debug, Clone, Default)]
pub struct Tokenizer {
    filter: Option<WordFilter>,
}

impl Tokenizer {
    /// Plain tokenizer used by the frequency and association analyses.
    pub fn new() -> Self {
        Self { filter: None }
    }

    /// Tokenizer that additionally applies `filter` (word cloud).
    pub fn with_filter(filter: WordFilter) -> Self {
        Self {
            filter: Some(filter),
        }
    }

    ///Lower-cases `text`, turns every char outside `[a-z]` into a word boundary and keeps words
    ///with `2 < len < 15`.
    /// # Example
    /// ```
    /// use review_text_analytics::tokenizer::Tokenizer;
    /// let words = Tokenizer::new().tokenize("Great pizza!!and 5-star service, ok?");
    /// assert_eq!(words, vec!["great", "pizza", "and", "star", "service"]);
    /// ```
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        // replacement, not deletion: "don't" -> "don" "t"
        text.to_lowercase()
            .split(|c: char| !c.is_ascii_lowercase())
            .filter(|word| word.len() > MIN_EXCLUSIVE_LEN && word.len() < MAX_EXCLUSIVE_LEN)
            .filter(|word| self.filter.as_ref().is_none_or(|f| f.accepts(word)))
            .map(String::from)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_bounds() {
        let tokenizer = Tokenizer::new();
        let words = tokenizer.tokenize("ab abc abcdefghijklmn abcdefghijklmno");
        // 2 chars dropped, 3 kept, 14 kept, 15 dropped
        assert_eq!(words, vec!["abc", "abcdefghijklmn"]);
    }

    #[test]
    fn test_tokenize_replaces_instead_of_deleting() {
        let tokenizer = Tokenizer::new();
        assert_eq!(
            tokenizer.tokenize("food/service,price"),
            vec!["food", "service", "price"]
        );
        assert_eq!(tokenizer.tokenize("won't"), vec!["won"]);
        assert_eq!(tokenizer.tokenize("pho2go"), vec!["pho"]);
        assert_eq!(tokenizer.tokenize("ab2cd"), Vec::<String>::new());
    }

    #[test]
    fn test_tokenize_non_ascii_is_boundary() {
        let tokenizer = Tokenizer::new();
        assert_eq!(tokenizer.tokenize("CAFÉ crème brûlée"), vec!["caf"]);
        assert_eq!(tokenizer.tokenize("naïve\tTHAI\n\nfood"), vec!["thai", "food"]);
    }

    #[test]
    fn test_word_cloud_filter() {
        let tokenizer = Tokenizer::with_filter(WordFilter::default());
        let words =
            tokenizer.tokenize("The staff were amazing and the tacos tasted really fresh");
        assert_eq!(words, vec!["staff", "tacos", "fresh"]);
    }

    #[test]
    fn test_suffix_rule_is_literal() {
        let tokenizer = Tokenizer::with_filter(WordFilter::default());
        // "bed" ends in "ed", "family" in "ly", "king" in "ing"
        assert!(tokenizer.tokenize("bed family king").is_empty());
        assert_eq!(tokenizer.tokenize("need"), Vec::<String>::new());
        assert_eq!(tokenizer.tokenize("needs"), vec!["needs"]);
    }

    #[test]
    fn test_alternate_stop_words() {
        let filter = WordFilter::new(StopWords::new(["pizza"]), Vec::new());
        let tokenizer = Tokenizer::with_filter(filter);
        assert_eq!(
            tokenizer.tokenize("the pizza was baked"),
            vec!["the", "was", "baked"]
        );
    }
}
