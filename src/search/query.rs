//! Query parsing: splits user input into object terms, search terms and
//! excluded terms.

use super::tokenize::{WordStemmer, is_stop_word, split_words};

/// A user query broken down for the two search passes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedQuery {
    /// Lowercased whitespace-separated words, dots and `-` prefixes kept,
    /// for object search.
    pub object_terms: Vec<String>,
    /// Stemmed terms every matching page must contain.
    pub search_terms: Vec<String>,
    /// Stemmed terms no matching page may contain (`-word`).
    pub excluded: Vec<String>,
}

impl ParsedQuery {
    /// Parse `query` using `stemmer` for term normalization.
    ///
    /// - `Calculator` → object term `calculator`, search term `calcul`
    /// - `ccc.utils` → object term `ccc.utils`, search terms `ccc`, `util`
    /// - `tax -inventory` → search term `tax`, excluded `inventori`
    pub fn parse(query: &str, stemmer: &WordStemmer) -> Self {
        let mut parsed = Self::default();

        for raw in query.split_whitespace() {
            let (negated, word) = match raw.strip_prefix('-') {
                Some(rest) if !rest.is_empty() => (true, rest),
                _ => (false, raw),
            };

            push_unique(&mut parsed.object_terms, raw.to_lowercase());

            for run in split_words(word) {
                let lowercase = run.to_lowercase();
                if is_stop_word(&lowercase) || lowercase.chars().all(|c| c.is_ascii_digit()) {
                    continue;
                }

                let term = stemmer.query_form(&lowercase);
                if negated {
                    push_unique(&mut parsed.excluded, term);
                } else {
                    push_unique(&mut parsed.search_terms, term);
                }
            }
        }

        parsed
    }

    pub fn is_empty(&self) -> bool {
        self.object_terms.is_empty() && self.search_terms.is_empty()
    }
}

fn push_unique(terms: &mut Vec<String>, term: String) {
    if !terms.contains(&term) {
        terms.push(term);
    }
}
