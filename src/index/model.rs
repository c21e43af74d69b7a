//! Typed representation of a Sphinx `searchindex.js` payload.
//!
//! Field order matches the generator's alphabetical key order so that
//! serializing through `serde_json` yields sections in the same sequence.

use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Priority of an object inside search results.
pub const PRIORITY_IMPORTANT: i32 = 0;
pub const PRIORITY_DEFAULT: i32 = 1;
pub const PRIORITY_UNIMPORTANT: i32 = 2;

/// A complete documentation search index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchIndex {
    /// Section title to the documents (and anchors) containing it.
    #[serde(default)]
    pub alltitles: Option<BTreeMap<String, Vec<(usize, Option<String>)>>>,
    /// Document identifiers, one per page.
    pub docnames: Vec<String>,
    /// Generator domain name to domain data version.
    #[serde(default)]
    pub envversion: BTreeMap<String, u64>,
    /// Source file path per document, parallel to `docnames`.
    pub filenames: Vec<String>,
    /// Object prefix (dotted parent path) to the objects declared under it.
    #[serde(default)]
    pub objects: BTreeMap<String, Vec<ObjectEntry>>,
    /// Type code to `(domain, role, label)`.
    #[serde(default)]
    pub objnames: BTreeMap<String, ObjectName>,
    /// Type code to `"domain:role"`.
    #[serde(default)]
    pub objtypes: BTreeMap<String, String>,
    /// Body token to the documents containing it.
    #[serde(default)]
    pub terms: BTreeMap<String, Postings>,
    /// Page title per document, parallel to `docnames`.
    #[serde(default)]
    pub titles: Vec<String>,
    /// Title token to the documents whose titles contain it.
    #[serde(default)]
    pub titleterms: BTreeMap<String, Postings>,
}

/// One object of the inventory, stored on the wire as
/// `[doc, typecode, priority, anchor, name]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ObjectTuple", into = "ObjectTuple")]
pub struct ObjectEntry {
    pub doc: usize,
    pub type_code: u32,
    pub priority: i32,
    /// `""` = full name, `"-"` = `<role>-<fullname>`, otherwise literal.
    pub anchor: String,
    pub name: String,
}

type ObjectTuple = (usize, u32, i32, String, String);

impl From<ObjectTuple> for ObjectEntry {
    fn from((doc, type_code, priority, anchor, name): ObjectTuple) -> Self {
        Self {
            doc,
            type_code,
            priority,
            anchor,
            name,
        }
    }
}

impl From<ObjectEntry> for ObjectTuple {
    fn from(entry: ObjectEntry) -> Self {
        (
            entry.doc,
            entry.type_code,
            entry.priority,
            entry.anchor,
            entry.name,
        )
    }
}

/// Human-readable description of an object type, stored as
/// `[domain, role, label]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(String, String, String)", into = "(String, String, String)")]
pub struct ObjectName {
    pub domain: String,
    pub role: String,
    pub label: String,
}

impl From<(String, String, String)> for ObjectName {
    fn from((domain, role, label): (String, String, String)) -> Self {
        Self {
            domain,
            role,
            label,
        }
    }
}

impl From<ObjectName> for (String, String, String) {
    fn from(name: ObjectName) -> Self {
        (name.domain, name.role, name.label)
    }
}

/// Document postings for one token.
///
/// The generator writes a bare integer when a token occurs in a single
/// document and a sorted array otherwise. Binary formats always use the
/// array form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Postings {
    One(usize),
    Many(Vec<usize>),
}

impl Postings {
    /// Build postings from a sorted, de-duplicated list.
    pub fn from_sorted(mut docs: Vec<usize>) -> Self {
        if docs.len() == 1 {
            Self::One(docs.remove(0))
        } else {
            Self::Many(docs)
        }
    }

    /// View the postings as a slice regardless of representation.
    pub fn docs(&self) -> &[usize] {
        match self {
            Self::One(doc) => std::slice::from_ref(doc),
            Self::Many(docs) => docs,
        }
    }

    pub fn contains(&self, doc: usize) -> bool {
        self.docs().contains(&doc)
    }
}

/// Binary form of [`Postings`]; keeps the variant so snapshots round-trip.
#[derive(Serialize)]
enum CompactPostingsRef<'a> {
    One(usize),
    Many(&'a [usize]),
}

#[derive(Deserialize)]
enum CompactPostings {
    One(usize),
    Many(Vec<usize>),
}

impl Serialize for Postings {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if !serializer.is_human_readable() {
            let compact = match self {
                Self::One(doc) => CompactPostingsRef::One(*doc),
                Self::Many(docs) => CompactPostingsRef::Many(docs),
            };
            return compact.serialize(serializer);
        }
        match self {
            Self::One(doc) => serializer.serialize_u64(*doc as u64),
            Self::Many(docs) => {
                let mut seq = serializer.serialize_seq(Some(docs.len()))?;
                for doc in docs {
                    seq.serialize_element(doc)?;
                }
                seq.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Postings {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PostingsVisitor;

        impl<'de> Visitor<'de> for PostingsVisitor {
            type Value = Postings;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a document index or a list of document indices")
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<Postings, E> {
                usize::try_from(value)
                    .map(Postings::One)
                    .map_err(|_| E::custom(format!("document index {} out of range", value)))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<Postings, E> {
                usize::try_from(value)
                    .map(Postings::One)
                    .map_err(|_| E::custom(format!("negative document index {}", value)))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Postings, A::Error> {
                let mut docs = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(doc) = seq.next_element::<usize>()? {
                    docs.push(doc);
                }
                Ok(Postings::Many(docs))
            }
        }

        if deserializer.is_human_readable() {
            deserializer.deserialize_any(PostingsVisitor)
        } else {
            Ok(match CompactPostings::deserialize(deserializer)? {
                CompactPostings::One(doc) => Postings::One(doc),
                CompactPostings::Many(docs) => Postings::Many(docs),
            })
        }
    }
}

/// A page of the documentation set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentRef<'a> {
    pub index: usize,
    pub docname: &'a str,
    pub filename: &'a str,
    pub title: &'a str,
}

/// An object of the inventory with its location resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef<'a> {
    pub prefix: &'a str,
    pub fullname: String,
    pub entry: &'a ObjectEntry,
    pub kind: Option<&'a ObjectName>,
    pub anchor: String,
}

impl ObjectRef<'_> {
    /// Human-readable type label, e.g. "Python function".
    pub fn label(&self) -> &str {
        self.kind.map_or("object", |kind| kind.label.as_str())
    }

    /// Short role name, e.g. "function".
    pub fn role(&self) -> &str {
        self.kind.map_or("object", |kind| kind.role.as_str())
    }
}

/// Summary counts of an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndexStats {
    pub documents: usize,
    pub objects: usize,
    pub object_types: usize,
    pub terms: usize,
    pub title_terms: usize,
}

/// Joins an object prefix and name into a fully qualified name.
pub fn full_name(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

impl SearchIndex {
    pub fn document_count(&self) -> usize {
        self.docnames.len()
    }

    /// Get the page at `index`, if it exists.
    pub fn document(&self, index: usize) -> Option<DocumentRef<'_>> {
        let docname = self.docnames.get(index)?;
        Some(DocumentRef {
            index,
            docname,
            filename: self.filenames.get(index).map_or("", String::as_str),
            title: self.titles.get(index).map_or("", String::as_str),
        })
    }

    /// Iterate all pages in index order.
    pub fn documents(&self) -> impl Iterator<Item = DocumentRef<'_>> {
        (0..self.docnames.len()).filter_map(|index| self.document(index))
    }

    /// Find a page by its docname.
    pub fn document_by_name(&self, docname: &str) -> Option<DocumentRef<'_>> {
        self.docnames
            .iter()
            .position(|name| name == docname)
            .and_then(|index| self.document(index))
    }

    /// Look up the description of a type code.
    pub fn object_name(&self, type_code: u32) -> Option<&ObjectName> {
        self.objnames.get(&type_code.to_string())
    }

    /// Human-readable label for a type code, falling back to `objtypes`.
    pub fn object_type_label(&self, type_code: u32) -> Option<&str> {
        self.object_name(type_code)
            .map(|name| name.label.as_str())
            .or_else(|| self.objtypes.get(&type_code.to_string()).map(String::as_str))
    }

    /// Expand the compact anchor encoding of an entry into a URL fragment.
    pub fn resolve_anchor(&self, prefix: &str, entry: &ObjectEntry) -> String {
        let fullname = full_name(prefix, &entry.name);
        match entry.anchor.as_str() {
            "" => fullname,
            "-" => {
                let role = self
                    .object_name(entry.type_code)
                    .map_or("object", |name| name.role.as_str());
                format!("{}-{}", role, fullname)
            }
            anchor => anchor.to_string(),
        }
    }

    /// Iterate every object of the inventory with its location resolved.
    pub fn objects_iter(&self) -> impl Iterator<Item = ObjectRef<'_>> {
        self.objects.iter().flat_map(move |(prefix, entries)| {
            entries.iter().map(move |entry| ObjectRef {
                prefix,
                fullname: full_name(prefix, &entry.name),
                entry,
                kind: self.object_name(entry.type_code),
                anchor: self.resolve_anchor(prefix, entry),
            })
        })
    }

    /// Exact lookup of a fully qualified object name.
    pub fn find_object(&self, fullname: &str) -> Option<ObjectRef<'_>> {
        let (prefix, name) = fullname.rsplit_once('.').unwrap_or(("", fullname));
        let entry = self
            .objects
            .get(prefix)?
            .iter()
            .find(|entry| entry.name == name)?;
        Some(ObjectRef {
            prefix: self.objects.get_key_value(prefix).map_or("", |(k, _)| k.as_str()),
            fullname: fullname.to_string(),
            entry,
            kind: self.object_name(entry.type_code),
            anchor: self.resolve_anchor(prefix, entry),
        })
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            documents: self.docnames.len(),
            objects: self.objects.values().map(Vec::len).sum(),
            object_types: self.objtypes.len(),
            terms: self.terms.len(),
            title_terms: self.titleterms.len(),
        }
    }
}
