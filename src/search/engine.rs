//! Ranked search over a loaded index.
//!
//! Three passes contribute results:
//! - **objects**: symbol names from the object inventory
//! - **terms**: pages whose body or title postings contain every query term
//! - **section titles**: headings listed in `alltitles`, when present
//!
//! Results from all passes are merged, de-duplicated and ranked by score.

use super::query::ParsedQuery;
use super::scoring::Scorer;
use super::tokenize::WordStemmer;
use crate::index::{ObjectRef, Postings, SearchIndex};
use ahash::{AHashMap, AHashSet};
use rapidfuzz::distance::jaro_winkler;
use std::collections::BTreeMap;

/// Which pass produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultKind {
    Object,
    Page,
    Section,
}

/// A single ranked hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub kind: ResultKind,
    pub doc: usize,
    pub docname: String,
    pub filename: String,
    /// Object full name, page title, or `page > section` title.
    pub title: String,
    /// URL fragment without the leading `#`.
    pub anchor: Option<String>,
    /// E.g. "Python function, in CCC utility functions" for objects.
    pub description: Option<String>,
    pub score: i32,
}

impl SearchResult {
    /// Relative URL of the hit inside the built HTML site.
    pub fn url(&self) -> String {
        match &self.anchor {
            Some(anchor) if !anchor.is_empty() => format!("{}.html#{}", self.docname, anchor),
            _ => format!("{}.html", self.docname),
        }
    }
}

/// A fuzzy match for an object name that does not resolve exactly.
#[derive(Debug, Clone)]
pub struct ObjectSuggestion {
    pub fullname: String,
    pub score: f64,
}

/// Query engine with a reusable stemmer and configurable weights.
#[derive(Debug, Default)]
pub struct SearchEngine {
    stemmer: WordStemmer,
    scorer: Scorer,
}

impl SearchEngine {
    pub fn new(scorer: Scorer) -> Self {
        Self {
            stemmer: WordStemmer::default(),
            scorer,
        }
    }

    pub const fn scorer(&self) -> &Scorer {
        &self.scorer
    }

    pub fn parse_query(&self, query: &str) -> ParsedQuery {
        ParsedQuery::parse(query, &self.stemmer)
    }

    /// Run all search passes and return at most `limit` results, best first.
    pub fn search(&self, index: &SearchIndex, query: &str, limit: usize) -> Vec<SearchResult> {
        let start = std::time::Instant::now();
        let parsed = self.parse_query(query);
        if parsed.is_empty() {
            return vec![];
        }

        let mut results = Vec::new();
        for (i, term) in parsed.object_terms.iter().enumerate() {
            let others: Vec<&str> = parsed
                .object_terms
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, other)| other.as_str())
                .collect();
            results.extend(self.object_search(index, term, &others));
        }
        results.extend(self.section_search(index, query));
        results.extend(self.term_search(index, &parsed));

        let results = rank(results, limit);
        tracing::debug!(
            "Search for {:?} produced {} results in {:?}",
            query,
            results.len(),
            start.elapsed()
        );
        results
    }

    /// Match one object term against the inventory. When other object terms
    /// exist, each must appear somewhere in the object's description.
    fn object_search(&self, index: &SearchIndex, term: &str, others: &[&str]) -> Vec<SearchResult> {
        if term.chars().count() < 2 {
            return vec![];
        }

        let mut results = Vec::new();
        for object in index.objects_iter() {
            let fullname_lower = object.fullname.to_lowercase();
            let Some(name_score) = self.scorer.object_name_score(&fullname_lower, term) else {
                continue;
            };
            let Some(doc) = index.document(object.entry.doc) else {
                continue;
            };

            if !others.is_empty() {
                let haystack = format!(
                    "{} {} {} {}",
                    object.prefix,
                    object.entry.name,
                    object.label(),
                    doc.title
                )
                .to_lowercase();
                if !others.iter().all(|other| haystack.contains(other)) {
                    continue;
                }
            }

            let score = name_score + self.scorer.priority_bonus(object.entry.priority);
            results.push(object_result(&object, doc.docname, doc.filename, doc.title, score));
        }
        results
    }

    /// Match section titles from `alltitles`. Titles much longer than the
    /// query are skipped; shorter titles score closer to the full title weight.
    fn section_search(&self, index: &SearchIndex, query: &str) -> Vec<SearchResult> {
        let Some(alltitles) = &index.alltitles else {
            return vec![];
        };
        let query_lower = query.trim().to_lowercase();
        if query_lower.is_empty() {
            return vec![];
        }
        let query_len = query_lower.chars().count();

        let mut results = Vec::new();
        for (title, locations) in alltitles {
            let title_len = title.chars().count().max(1);
            if !title.trim().to_lowercase().contains(&query_lower) || query_len * 2 < title_len {
                continue;
            }
            let base = (f64::from(self.scorer.title) * query_len as f64 / title_len as f64).round();
            for (doc_idx, anchor) in locations {
                let Some(doc) = index.document(*doc_idx) else {
                    continue;
                };
                let is_page_title = doc.title == title;
                results.push(SearchResult {
                    kind: ResultKind::Section,
                    doc: doc.index,
                    docname: doc.docname.to_string(),
                    filename: doc.filename.to_string(),
                    title: if is_page_title {
                        title.clone()
                    } else {
                        format!("{} > {}", doc.title, title)
                    },
                    anchor: anchor.clone(),
                    description: None,
                    // Saturating cast: scores are tiny in practice
                    score: base as i32 + i32::from(is_page_title),
                });
            }
        }
        results
    }

    /// Match pages through the inverted indexes.
    fn term_search(&self, index: &SearchIndex, parsed: &ParsedQuery) -> Vec<SearchResult> {
        let mut file_map: AHashMap<usize, AHashSet<&str>> = AHashMap::new();
        let mut score_map: AHashMap<usize, i32> = AHashMap::new();

        for word in &parsed.search_terms {
            let sources = self.postings_for(index, word);
            if sources.is_empty() {
                break;
            }
            for (postings, score) in sources {
                for &doc in postings.docs() {
                    file_map.entry(doc).or_default().insert(word.as_str());
                    let best = score_map.entry(doc).or_insert(i32::MIN);
                    *best = (*best).max(score);
                }
            }
        }

        let required = parsed.search_terms.len();
        let required_long = parsed
            .search_terms
            .iter()
            .filter(|term| term.chars().count() > 2)
            .count();

        let mut results = Vec::new();
        for (doc_idx, matched) in file_map {
            if matched.len() != required && matched.len() != required_long {
                continue;
            }
            let excluded = parsed.excluded.iter().any(|term| {
                index.terms.get(term).is_some_and(|p| p.contains(doc_idx))
                    || index.titleterms.get(term).is_some_and(|p| p.contains(doc_idx))
            });
            if excluded {
                continue;
            }
            let Some(doc) = index.document(doc_idx) else {
                continue;
            };
            results.push(SearchResult {
                kind: ResultKind::Page,
                doc: doc.index,
                docname: doc.docname.to_string(),
                filename: doc.filename.to_string(),
                title: doc.title.to_string(),
                anchor: None,
                description: None,
                score: score_map.get(&doc_idx).copied().unwrap_or(0),
            });
        }
        results
    }

    /// Exact postings for `word` in both maps, plus partial matches for
    /// words longer than two characters that have no exact entry.
    fn postings_for<'a>(&self, index: &'a SearchIndex, word: &str) -> Vec<(&'a Postings, i32)> {
        let mut sources = Vec::new();
        let partial = word.chars().count() > 2;

        let mut collect = |map: &'a BTreeMap<String, Postings>, exact: i32, partial_score: i32| {
            match map.get(word) {
                Some(postings) => sources.push((postings, exact)),
                None if partial => sources.extend(
                    map.iter()
                        .filter(|(key, _)| key.contains(word))
                        .map(|(_, postings)| (postings, partial_score)),
                ),
                None => {}
            }
        };

        collect(&index.terms, self.scorer.term, self.scorer.partial_term);
        collect(&index.titleterms, self.scorer.title, self.scorer.partial_title);
        sources
    }

    /// Resolve an object name exactly, then case-insensitively on the full
    /// name or the last dotted component.
    pub fn find_objects<'a>(&self, index: &'a SearchIndex, name: &str) -> Vec<ObjectRef<'a>> {
        if let Some(object) = index.find_object(name) {
            return vec![object];
        }
        let lower = name.to_lowercase();
        index
            .objects_iter()
            .filter(|object| {
                let fullname = object.fullname.to_lowercase();
                fullname == lower || object.entry.name.to_lowercase() == lower
            })
            .collect()
    }

    /// Fuzzy suggestions for a name, best first.
    pub fn suggest_objects(
        &self,
        index: &SearchIndex,
        name: &str,
        limit: usize,
    ) -> Vec<ObjectSuggestion> {
        let lower = name.to_lowercase();
        let mut suggestions: Vec<ObjectSuggestion> = index
            .objects_iter()
            .map(|object| {
                let fullname = object.fullname.to_lowercase();
                let short = object.entry.name.to_lowercase();
                let score = jaro_winkler::similarity(lower.chars(), fullname.chars())
                    .max(jaro_winkler::similarity(lower.chars(), short.chars()));
                ObjectSuggestion {
                    fullname: object.fullname,
                    score,
                }
            })
            .collect();
        suggestions.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.fullname.cmp(&b.fullname))
        });
        suggestions.truncate(limit);
        suggestions
    }
}

fn object_result(
    object: &ObjectRef<'_>,
    docname: &str,
    filename: &str,
    page_title: &str,
    score: i32,
) -> SearchResult {
    SearchResult {
        kind: ResultKind::Object,
        doc: object.entry.doc,
        docname: docname.to_string(),
        filename: filename.to_string(),
        title: object.fullname.clone(),
        anchor: Some(object.anchor.clone()),
        description: Some(format!("{}, in {}", object.label(), page_title)),
        score,
    }
}

/// De-duplicate, order by score (highest first) then title, and truncate.
fn rank(results: Vec<SearchResult>, limit: usize) -> Vec<SearchResult> {
    let mut best: AHashMap<(String, String, Option<String>), SearchResult> = AHashMap::new();
    for result in results {
        let key = (
            result.docname.clone(),
            result.title.clone(),
            result.anchor.clone(),
        );
        match best.get(&key) {
            Some(existing) if existing.score >= result.score => {}
            _ => {
                best.insert(key, result);
            }
        }
    }

    let mut ranked: Vec<_> = best.into_values().collect();
    ranked.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
            .then_with(|| a.docname.cmp(&b.docname))
    });
    ranked.truncate(limit);
    ranked
}
