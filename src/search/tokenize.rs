//! Text tokenization and stemming shared by index building and querying.
//!
//! Both sides must agree on how words are split, stemmed and filtered,
//! otherwise query terms never line up with indexed terms.

use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::sync::LazyLock;

/// English stop words, never indexed and ignored in queries.
pub const STOP_WORDS: &[&str] = &[
    "a", "and", "are", "as", "at", "be", "but", "by", "for", "if", "in", "into", "is", "it",
    "near", "no", "not", "of", "on", "or", "such", "that", "the", "their", "then", "there",
    "these", "they", "this", "to", "was", "will", "with",
];

static WORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    // \w is Unicode-aware in the regex crate
    Regex::new(r"\w+").unwrap_or_else(|e| panic!("invalid word pattern: {}", e))
});

pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(&word)
}

/// Splits text into runs of word characters.
pub fn split_words(text: &str) -> impl Iterator<Item = &str> {
    WORD_RE.find_iter(text).map(|m| m.as_str())
}

/// Whether a (lowercased) word may be stored in the index.
///
/// Rejects stop words and one- or two-character hiragana fragments.
/// Everything else passes, including digits and single letters.
pub fn word_filter(word: &str) -> bool {
    let Some(first) = word.chars().next() else {
        return true;
    };
    let short_hiragana = word.chars().count() < 3 && ('\u{3042}'..'\u{3094}').contains(&first);
    let stop_word = (first as u32) < 256 && is_stop_word(word);
    !(short_hiragana || stop_word)
}

/// Lowercases and stems words with the English Snowball stemmer.
pub struct WordStemmer {
    stemmer: Stemmer,
}

impl Default for WordStemmer {
    fn default() -> Self {
        Self {
            stemmer: Stemmer::create(Algorithm::English),
        }
    }
}

impl std::fmt::Debug for WordStemmer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("WordStemmer(english)")
    }
}

impl WordStemmer {
    pub fn stem(&self, word: &str) -> String {
        let lowercase = word.to_lowercase();
        self.stemmer.stem(&lowercase).into_owned()
    }

    /// Stem for indexing: falls back to the plain lowercase word when the
    /// stem would be filtered out but the word itself would not.
    pub fn index_form(&self, word: &str) -> Option<String> {
        let stemmed = self.stem(word);
        if word_filter(&stemmed) {
            return Some(stemmed);
        }
        let lowercase = word.to_lowercase();
        word_filter(&lowercase).then_some(lowercase)
    }

    /// Stem for querying: keeps the unstemmed word when stemming would cut a
    /// word of three or more characters below three.
    pub fn query_form(&self, word: &str) -> String {
        let lowercase = word.to_lowercase();
        let stemmed = self.stemmer.stem(&lowercase);
        if stemmed.chars().count() < 3 && lowercase.chars().count() >= 3 {
            lowercase
        } else {
            stemmed.into_owned()
        }
    }
}
