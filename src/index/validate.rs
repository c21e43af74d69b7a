//! Structural consistency checks for a loaded index.

use crate::index::{Postings, SearchIndex};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// How serious a validation finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => f.write_str("warning"),
            Self::Error => f.write_str("error"),
        }
    }
}

/// A single inconsistency found in an index.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationIssue {
    #[error("{section} has {actual} entries but docnames has {expected}")]
    LengthMismatch {
        section: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("docname '{docname}' appears more than once")]
    DuplicateDocname { docname: String },
    #[error("{section} entry '{key}' references document {doc}, but only {count} documents exist")]
    DocumentOutOfRange {
        section: &'static str,
        key: String,
        doc: usize,
        count: usize,
    },
    #[error("object '{fullname}' uses type code {type_code}, which is missing from {section}")]
    UnknownObjectType {
        fullname: String,
        type_code: u32,
        section: &'static str,
    },
    #[error("type code '{code}' is {problem}")]
    TypeTableMismatch { code: String, problem: String },
    #[error("{section} postings for '{key}' are not strictly ascending")]
    UnsortedPostings { section: &'static str, key: String },
}

impl ValidationIssue {
    pub const fn severity(&self) -> Severity {
        match self {
            Self::TypeTableMismatch { .. } | Self::UnsortedPostings { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

/// Outcome of validating an index.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// True when no error-level issue was found. Warnings are allowed.
    pub fn is_valid(&self) -> bool {
        self.errors().next().is_none()
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues
            .iter()
            .filter(|issue| issue.severity() == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues
            .iter()
            .filter(|issue| issue.severity() == Severity::Warning)
    }
}

/// Run every structural check against `index`.
pub fn validate(index: &SearchIndex) -> ValidationReport {
    let mut issues = Vec::new();
    let count = index.docnames.len();

    for (section, len) in [
        ("filenames", index.filenames.len()),
        ("titles", index.titles.len()),
    ] {
        if len != count {
            issues.push(ValidationIssue::LengthMismatch {
                section,
                expected: count,
                actual: len,
            });
        }
    }

    let mut seen = HashSet::with_capacity(count);
    for docname in &index.docnames {
        if !seen.insert(docname.as_str()) {
            issues.push(ValidationIssue::DuplicateDocname {
                docname: docname.clone(),
            });
        }
    }

    check_objects(index, &mut issues);
    check_type_tables(index, &mut issues);
    check_postings("terms", &index.terms, count, &mut issues);
    check_postings("titleterms", &index.titleterms, count, &mut issues);

    if let Some(alltitles) = &index.alltitles {
        for (title, locations) in alltitles {
            for (doc, _) in locations {
                if *doc >= count {
                    issues.push(ValidationIssue::DocumentOutOfRange {
                        section: "alltitles",
                        key: title.clone(),
                        doc: *doc,
                        count,
                    });
                }
            }
        }
    }

    if issues.is_empty() {
        tracing::debug!("Index with {} documents passed validation", count);
    } else {
        tracing::debug!("Index validation found {} issues", issues.len());
    }

    ValidationReport { issues }
}

fn check_objects(index: &SearchIndex, issues: &mut Vec<ValidationIssue>) {
    let count = index.docnames.len();
    for object in index.objects_iter() {
        if object.entry.doc >= count {
            issues.push(ValidationIssue::DocumentOutOfRange {
                section: "objects",
                key: object.fullname.clone(),
                doc: object.entry.doc,
                count,
            });
        }

        let code = object.entry.type_code.to_string();
        for (section, present) in [
            ("objtypes", index.objtypes.contains_key(&code)),
            ("objnames", index.objnames.contains_key(&code)),
        ] {
            if !present {
                issues.push(ValidationIssue::UnknownObjectType {
                    fullname: object.fullname.clone(),
                    type_code: object.entry.type_code,
                    section,
                });
            }
        }
    }
}

fn check_type_tables(index: &SearchIndex, issues: &mut Vec<ValidationIssue>) {
    for (code, objtype) in &index.objtypes {
        match index.objnames.get(code) {
            Some(name) => {
                let expected = format!("{}:{}", name.domain, name.role);
                if *objtype != expected {
                    issues.push(ValidationIssue::TypeTableMismatch {
                        code: code.clone(),
                        problem: format!(
                            "'{}' in objtypes but '{}' in objnames",
                            objtype, expected
                        ),
                    });
                }
            }
            None => issues.push(ValidationIssue::TypeTableMismatch {
                code: code.clone(),
                problem: "present in objtypes but missing from objnames".to_string(),
            }),
        }
    }

    for code in index.objnames.keys() {
        if !index.objtypes.contains_key(code) {
            issues.push(ValidationIssue::TypeTableMismatch {
                code: code.clone(),
                problem: "present in objnames but missing from objtypes".to_string(),
            });
        }
    }
}

fn check_postings(
    section: &'static str,
    postings: &BTreeMap<String, Postings>,
    count: usize,
    issues: &mut Vec<ValidationIssue>,
) {
    for (key, docs) in postings {
        let docs = docs.docs();
        if let Some(&doc) = docs.iter().find(|&&doc| doc >= count) {
            issues.push(ValidationIssue::DocumentOutOfRange {
                section,
                key: key.clone(),
                doc,
                count,
            });
        }
        if docs.windows(2).any(|pair| pair[0] >= pair[1]) {
            issues.push(ValidationIssue::UnsortedPostings {
                section,
                key: key.clone(),
            });
        }
    }
}
