//! Collects documentation pages from a source tree.
//!
//! Supports reStructuredText, Markdown and plain text. Only what the index
//! needs is extracted: the page title, section headings, body words and
//! Python-domain object directives.

use super::{DocumentSource, IndexBuilder, ObjectDescription};
use crate::error::Result;
use crate::index::SearchIndex;
use anyhow::Context;
use ignore::WalkBuilder;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// File extensions treated as documentation pages.
pub const SOURCE_EXTENSIONS: &[&str] = &["rst", "md", "txt"];

static MD_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(#{1,6})\s+(.+?)\s*#*\s*$").unwrap_or_else(|e| panic!("invalid pattern: {}", e))
});

static RST_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\s*)\.\.\s+(?:py:)?(auto)?(module|currentmodule|function|class|method|classmethod|staticmethod|attribute|property|data|exception)::\s*(.*)$")
        .unwrap_or_else(|e| panic!("invalid pattern: {}", e))
});

/// Walk `root` and parse every documentation page found.
///
/// Directories starting with `_` or `.` (build output, static assets) are
/// skipped, as is anything excluded by ignore files.
pub fn collect(root: &Path) -> Result<Vec<DocumentSource>> {
    let mut pages = Vec::new();

    let walker = WalkBuilder::new(root)
        .filter_entry(|entry| {
            let name = entry.file_name().to_string_lossy();
            entry.depth() == 0 || !(name.starts_with('_') || name.starts_with('.'))
        })
        .build();

    for entry in walker {
        let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
        let path = entry.path();
        let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
            continue;
        };
        if !entry.file_type().is_some_and(|t| t.is_file()) || !SOURCE_EXTENSIONS.contains(&ext) {
            continue;
        }

        let relative = path.strip_prefix(root).unwrap_or(path);
        let filename = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let docname = filename
            .strip_suffix(&format!(".{}", ext))
            .unwrap_or(&filename)
            .to_string();

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        pages.push(parse_page(&docname, &filename, &text));
    }

    pages.sort_by(|a, b| a.docname.cmp(&b.docname));
    tracing::debug!("Collected {} pages from {}", pages.len(), root.display());
    Ok(pages)
}

/// Collect a source tree and build its index in one step.
pub fn build_from_dir(root: &Path) -> Result<SearchIndex> {
    let mut builder = IndexBuilder::new();
    for page in collect(root)? {
        builder.feed(page);
    }
    Ok(builder.freeze())
}

/// Parse one page, picking the markup from the filename extension.
pub fn parse_page(docname: &str, filename: &str, text: &str) -> DocumentSource {
    let mut doc = if filename.ends_with(".md") {
        parse_markdown(text)
    } else if filename.ends_with(".rst") {
        parse_rst(text)
    } else {
        DocumentSource {
            title: text.lines().find(|l| !l.trim().is_empty()).unwrap_or("").trim().to_string(),
            body: text.to_string(),
            ..DocumentSource::default()
        }
    };

    if doc.title.is_empty() {
        doc.title = docname.rsplit('/').next().unwrap_or(docname).to_string();
    }
    doc.docname = docname.to_string();
    doc.filename = filename.to_string();
    doc
}

fn parse_markdown(text: &str) -> DocumentSource {
    let mut doc = DocumentSource::default();
    let mut body = String::with_capacity(text.len());
    let mut in_fence = false;

    for line in text.lines() {
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
            continue;
        }
        if !in_fence && let Some(caps) = MD_HEADING.captures(line) {
            add_heading(&mut doc, caps[2].trim());
            continue;
        }
        body.push_str(line);
        body.push('\n');
    }

    doc.body = body;
    doc
}

/// Punctuation-only lines used as section adornments.
fn is_adornment(line: &str) -> bool {
    let trimmed = line.trim_end();
    let mut chars = trimmed.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    trimmed.len() >= 3 && "=-~^\"*+#'`:._".contains(first) && chars.all(|c| c == first)
}

#[derive(Default)]
struct RstScope {
    module: Option<String>,
    class: Option<(String, usize)>,
}

impl RstScope {
    fn qualify(&self, name: &str) -> String {
        match &self.module {
            Some(module) if !name.starts_with(&format!("{}.", module)) => {
                format!("{}.{}", module, name)
            }
            _ => name.to_string(),
        }
    }
}

fn parse_rst(text: &str) -> DocumentSource {
    let mut doc = DocumentSource::default();
    let mut body = String::with_capacity(text.len());
    let mut scope = RstScope::default();
    let lines: Vec<&str> = text.lines().collect();

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        let next = lines.get(i + 1).copied().unwrap_or("");

        if is_adornment(line) {
            i += 1;
            continue;
        }

        let trimmed = line.trim();
        if !trimmed.is_empty()
            && !line.starts_with(char::is_whitespace)
            && is_adornment(next)
            && next.trim_end().chars().count() >= trimmed.chars().count()
        {
            add_heading(&mut doc, trimmed);
            i += 2;
            continue;
        }

        if let Some(caps) = RST_DIRECTIVE.captures(line) {
            let indent = caps[1].len();
            let is_auto = caps.get(2).is_some();
            let role = &caps[3];
            if let Some(name) = signature_name(&caps[4]) {
                let declared = doc.objects.len();
                add_object(&mut doc, &mut scope, role, name, indent, is_auto);
                if has_noindex_option(&lines[i + 1..], indent) {
                    doc.objects.truncate(declared);
                }
            }
            i += 1;
            continue;
        }

        // Directive options such as `:members:` carry no searchable text
        if !(trimmed.starts_with(':') && trimmed[1..].contains(':')) {
            body.push_str(line);
            body.push('\n');
        }
        i += 1;
    }

    doc.body = body;
    doc
}

/// Whether the option block following a directive at `indent` contains
/// `:noindex:` or `:no-index:`.
fn has_noindex_option(rest: &[&str], indent: usize) -> bool {
    rest.iter()
        .take_while(|line| {
            let trimmed = line.trim_start();
            trimmed.starts_with(':') && line.len() - trimmed.len() > indent
        })
        .any(|line| matches!(line.trim(), ":noindex:" | ":no-index:"))
}

/// Extract the dotted object name from a directive signature such as
/// `Calculator(p=None, assets=None)` or `async fetch()`.
fn signature_name(signature: &str) -> Option<&str> {
    let head = signature.split('(').next()?.trim();
    let name = head.split_whitespace().last()?;
    let name = name.trim_end_matches(':');
    (!name.is_empty()).then_some(name)
}

fn add_object(
    doc: &mut DocumentSource,
    scope: &mut RstScope,
    role: &str,
    name: &str,
    indent: usize,
    is_auto: bool,
) {
    if scope.class.as_ref().is_some_and(|(_, depth)| indent <= *depth) {
        scope.class = None;
    }

    match role {
        "module" | "currentmodule" => {
            scope.module = Some(name.to_string());
            scope.class = None;
            if role == "module" {
                doc.objects.push(ObjectDescription::python(name, "module"));
            }
        }
        "class" | "exception" => {
            let fullname = scope.qualify(name);
            doc.objects.push(ObjectDescription::python(fullname.clone(), role));
            // autoclass documents members without nested directives
            if !is_auto {
                scope.class = Some((fullname, indent));
            }
        }
        "method" | "classmethod" | "staticmethod" | "attribute" | "property" => {
            let role = if role == "attribute" || role == "property" {
                role
            } else {
                "method"
            };
            let fullname = match &scope.class {
                Some((class, _)) if !name.contains('.') => format!("{}.{}", class, name),
                _ => scope.qualify(name),
            };
            doc.objects.push(ObjectDescription::python(fullname, role));
        }
        _ => {
            doc.objects.push(ObjectDescription::python(scope.qualify(name), role));
        }
    }
}

fn add_heading(doc: &mut DocumentSource, heading: &str) {
    if doc.title.is_empty() {
        doc.title = heading.to_string();
    } else {
        doc.section_titles
            .push((heading.to_string(), Some(slugify(heading))));
    }
}

/// Section anchor in the style of generated HTML ids.
pub(crate) fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut dash = false;
    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            slug.push(c);
            dash = false;
        } else if !dash && !slug.is_empty() {
            slug.push('-');
            dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}
