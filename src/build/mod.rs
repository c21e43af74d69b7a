//! Index generation: turns documentation pages into a [`SearchIndex`].
//!
//! Pages are fed one at a time with [`IndexBuilder::feed`]; [`IndexBuilder::freeze`]
//! assigns document numbers and produces the compact index layout.

pub mod source;

use crate::index::{ObjectEntry, ObjectName, PRIORITY_DEFAULT, Postings, SearchIndex};
use crate::search::{WordStemmer, split_words};
use ahash::AHashMap;
use std::collections::{BTreeMap, BTreeSet};

/// Version recorded in `envversion` for indexes produced by this builder.
const BUILDER_VERSION: u64 = 1;

/// An API object declared on a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectDescription {
    /// Fully qualified name, e.g. `ccc.calculator.Calculator.calc_all`.
    pub fullname: String,
    /// Domain, e.g. `py`.
    pub domain: String,
    /// Role within the domain, e.g. `method`.
    pub role: String,
    /// Human label, e.g. `Python method`.
    pub label: String,
    /// URL fragment of the object on its page.
    pub anchor: String,
    /// 0 important, 1 default, 2 unimportant; negative hides the object.
    pub priority: i32,
}

impl ObjectDescription {
    /// A Python-domain object with the default priority and anchor.
    pub fn python(fullname: impl Into<String>, role: &str) -> Self {
        let fullname = fullname.into();
        let anchor = if role == "module" {
            format!("module-{}", fullname)
        } else {
            fullname.clone()
        };
        Self {
            fullname,
            domain: "py".to_string(),
            role: role.to_string(),
            label: format!("Python {}", role),
            anchor,
            priority: if role == "module" { 0 } else { PRIORITY_DEFAULT },
        }
    }
}

/// A documentation page ready to be indexed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentSource {
    pub docname: String,
    pub filename: String,
    pub title: String,
    /// Section headings below the page title, with their anchors.
    pub section_titles: Vec<(String, Option<String>)>,
    pub body: String,
    pub objects: Vec<ObjectDescription>,
}

#[derive(Debug)]
struct PageEntry {
    filename: String,
    title: String,
    titles: Vec<(String, Option<String>)>,
}

/// Accumulates pages and produces a frozen index.
#[derive(Debug, Default)]
pub struct IndexBuilder {
    stemmer: WordStemmer,
    pages: BTreeMap<String, PageEntry>,
    /// Body word to docnames.
    mapping: AHashMap<String, BTreeSet<String>>,
    /// Title word to docnames.
    title_mapping: AHashMap<String, BTreeSet<String>>,
    objects: BTreeMap<String, Vec<ObjectDescription>>,
    stem_cache: AHashMap<String, Option<String>>,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Index one page. Feeding a docname again replaces its earlier content.
    pub fn feed(&mut self, doc: DocumentSource) {
        if self.pages.contains_key(&doc.docname) {
            tracing::debug!("Re-indexing {}", doc.docname);
            self.remove(&doc.docname);
        }

        let docname = doc.docname;
        for text in std::iter::once(&doc.title).chain(doc.section_titles.iter().map(|(t, _)| t)) {
            for word in split_words(text) {
                if let Some(term) = self.index_form(word) {
                    self.title_mapping
                        .entry(term)
                        .or_default()
                        .insert(docname.clone());
                }
            }
        }

        for word in split_words(&doc.body) {
            let Some(term) = self.index_form(word) else {
                continue;
            };
            let in_title = self
                .title_mapping
                .get(&term)
                .is_some_and(|docs| docs.contains(&docname));
            if !in_title {
                self.mapping.entry(term).or_default().insert(docname.clone());
            }
        }

        let mut titles = Vec::with_capacity(doc.section_titles.len() + 1);
        if !doc.title.is_empty() {
            titles.push((doc.title.clone(), Some(source::slugify(&doc.title))));
        }
        titles.extend(doc.section_titles);

        self.objects.insert(docname.clone(), doc.objects);
        self.pages.insert(
            docname,
            PageEntry {
                filename: doc.filename,
                title: doc.title,
                titles,
            },
        );
    }

    /// Forget everything recorded for `docname`.
    pub fn remove(&mut self, docname: &str) {
        self.pages.remove(docname);
        self.objects.remove(docname);
        for map in [&mut self.mapping, &mut self.title_mapping] {
            map.retain(|_, docs| {
                docs.remove(docname);
                !docs.is_empty()
            });
        }
    }

    fn index_form(&mut self, word: &str) -> Option<String> {
        if let Some(cached) = self.stem_cache.get(word) {
            return cached.clone();
        }
        let form = self.stemmer.index_form(word);
        self.stem_cache.insert(word.to_string(), form.clone());
        form
    }

    /// Produce the final index. Document numbers follow docname order.
    pub fn freeze(&self) -> SearchIndex {
        let start = std::time::Instant::now();
        let doc_index: AHashMap<&str, usize> = self
            .pages
            .keys()
            .enumerate()
            .map(|(i, docname)| (docname.as_str(), i))
            .collect();

        let mut index = SearchIndex {
            docnames: self.pages.keys().cloned().collect(),
            filenames: self.pages.values().map(|p| p.filename.clone()).collect(),
            titles: self.pages.values().map(|p| p.title.clone()).collect(),
            terms: freeze_postings(&self.mapping, &doc_index),
            titleterms: freeze_postings(&self.title_mapping, &doc_index),
            ..SearchIndex::default()
        };
        index
            .envversion
            .insert(env!("CARGO_PKG_NAME").replace('-', "_"), BUILDER_VERSION);

        self.freeze_objects(&doc_index, &mut index);

        let mut alltitles: BTreeMap<String, Vec<(usize, Option<String>)>> = BTreeMap::new();
        for (docname, page) in &self.pages {
            let Some(&doc) = doc_index.get(docname.as_str()) else {
                continue;
            };
            for (title, anchor) in &page.titles {
                alltitles
                    .entry(title.clone())
                    .or_default()
                    .push((doc, anchor.clone()));
            }
        }
        if !alltitles.is_empty() {
            index.alltitles = Some(alltitles);
        }

        tracing::info!(
            "Built search index: {} documents, {} terms, {} title terms, {} objects in {:?}",
            index.docnames.len(),
            index.terms.len(),
            index.titleterms.len(),
            index.stats().objects,
            start.elapsed()
        );
        index
    }

    fn freeze_objects(&self, doc_index: &AHashMap<&str, usize>, index: &mut SearchIndex) {
        let mut all: Vec<(&str, &ObjectDescription)> = self
            .objects
            .iter()
            .flat_map(|(docname, objects)| objects.iter().map(move |o| (docname.as_str(), o)))
            .filter(|(_, object)| object.priority >= 0)
            .collect();
        all.sort_by(|(doc_a, a), (doc_b, b)| {
            (&a.domain, &a.fullname, doc_a).cmp(&(&b.domain, &b.fullname, doc_b))
        });

        let mut type_codes: AHashMap<(&str, &str), u32> = AHashMap::new();
        for (docname, object) in all {
            let Some(&doc) = doc_index.get(docname) else {
                continue;
            };
            let next = u32::try_from(type_codes.len()).unwrap_or(u32::MAX);
            let type_code = *type_codes
                .entry((object.domain.as_str(), object.role.as_str()))
                .or_insert_with(|| {
                    index.objtypes.insert(
                        next.to_string(),
                        format!("{}:{}", object.domain, object.role),
                    );
                    index.objnames.insert(
                        next.to_string(),
                        ObjectName {
                            domain: object.domain.clone(),
                            role: object.role.clone(),
                            label: object.label.clone(),
                        },
                    );
                    next
                });

            let fullname = escape_html(&object.fullname);
            let (prefix, name) = fullname.rsplit_once('.').unwrap_or(("", fullname.as_str()));
            let anchor = if object.anchor == object.fullname {
                String::new()
            } else if object.anchor == format!("{}-{}", object.role, object.fullname) {
                "-".to_string()
            } else {
                object.anchor.clone()
            };

            index
                .objects
                .entry(prefix.to_string())
                .or_default()
                .push(ObjectEntry {
                    doc,
                    type_code,
                    priority: object.priority,
                    anchor,
                    name: name.to_string(),
                });
        }
    }
}

fn freeze_postings(
    mapping: &AHashMap<String, BTreeSet<String>>,
    doc_index: &AHashMap<&str, usize>,
) -> BTreeMap<String, Postings> {
    mapping
        .iter()
        .map(|(word, docnames)| {
            let mut docs: Vec<usize> = docnames
                .iter()
                .filter_map(|docname| doc_index.get(docname.as_str()).copied())
                .collect();
            docs.sort_unstable();
            (word.clone(), Postings::from_sorted(docs))
        })
        .collect()
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
