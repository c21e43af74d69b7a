//! Markdown renderings shared by the MCP tools and the CLI.

use crate::index::{IndexStats, ObjectRef, SearchIndex, ValidationReport};
use crate::search::{ObjectSuggestion, ResultKind, SearchResult};
use std::fmt::Write as _;
use std::path::Path;

/// Minimum similarity for a fuzzy suggestion to be shown.
pub const SUGGESTION_THRESHOLD: f64 = 0.75;

/// One-line summary of an index.
pub fn render_stats(stats: &IndexStats) -> String {
    format!(
        "{} documents, {} objects ({} types), {} terms, {} title terms",
        stats.documents, stats.objects, stats.object_types, stats.terms, stats.title_terms
    )
}

/// Response for switching the active index.
pub fn render_set_index(path: &Path, index: &SearchIndex, previous: Option<&Path>) -> String {
    let mut output = format!("Search index set: {}\n", path.display());
    match previous {
        Some(previous) if previous != path => {
            let _ = writeln!(output, "(previously: {})", previous.display());
        }
        Some(_) => output.push_str("(unchanged)\n"),
        None => {}
    }
    let _ = writeln!(output, "\n{}", render_stats(&index.stats()));
    if !index.envversion.is_empty() {
        let versions: Vec<String> = index
            .envversion
            .iter()
            .map(|(domain, version)| format!("{} {}", domain, version))
            .collect();
        let _ = writeln!(output, "Generator versions: {}", versions.join(", "));
    }
    output
}

/// Ranked search results as a numbered list.
pub fn render_search_results(query: &str, results: &[SearchResult]) -> String {
    if results.is_empty() {
        let mut msg = format!("No results found for '{}'.\n\n", query);
        msg.push_str("Search tips:\n");
        msg.push_str("• Try a shorter or more general term\n");
        msg.push_str("• Search for API names like 'Calculator' or 'wavg'\n");
        msg.push_str("• Search uses stemming: 'depreciating' matches 'depreciation'\n");
        msg.push_str("• Prefix a word with '-' to exclude pages containing it\n");
        return msg;
    }

    let mut output = format!("Search results for '{}':\n\n", query);
    for (idx, result) in results.iter().enumerate() {
        let kind = match result.kind {
            ResultKind::Object => "object",
            ResultKind::Page => "page",
            ResultKind::Section => "section",
        };
        let _ = writeln!(
            output,
            "{}. `{}` ({}) - score: {}",
            idx + 1,
            result.title,
            kind,
            result.score
        );
        if let Some(description) = &result.description {
            let _ = writeln!(output, "   {}", description);
        }
        let _ = writeln!(output, "   {}\n", result.url());
    }
    output
}

/// Details of one object.
pub fn render_object(index: &SearchIndex, object: &ObjectRef<'_>) -> String {
    let mut output = format!("## `{}`\n\n", object.fullname);
    let _ = writeln!(output, "- Type: {}", object.label());
    if let Some(kind) = object.kind {
        let _ = writeln!(output, "- Role: {}:{}", kind.domain, kind.role);
    }
    if let Some(doc) = index.document(object.entry.doc) {
        let _ = writeln!(output, "- Page: {} (`{}`)", doc.title, doc.filename);
        let _ = writeln!(output, "- URL: {}.html#{}", doc.docname, object.anchor);
    } else {
        let _ = writeln!(output, "- Page: unknown document {}", object.entry.doc);
    }
    let _ = writeln!(output, "- Priority: {}", object.entry.priority);

    let members: Vec<&str> = index
        .objects
        .get(object.fullname.as_str())
        .map(|entries| entries.iter().map(|e| e.name.as_str()).collect())
        .unwrap_or_default();
    if !members.is_empty() {
        let _ = writeln!(output, "\nMembers ({}):", members.len());
        for member in members {
            let _ = writeln!(output, "  - {}", member);
        }
    }
    output
}

/// Response for a name that did not resolve exactly.
pub fn render_suggestions(name: &str, suggestions: &[ObjectSuggestion]) -> String {
    let shown: Vec<&ObjectSuggestion> = suggestions
        .iter()
        .filter(|s| s.score >= SUGGESTION_THRESHOLD)
        .collect();
    if shown.is_empty() {
        return format!("Object '{}' not found.\n", name);
    }
    let mut output = format!("Object '{}' not found. Did you mean one of these?\n\n", name);
    for suggestion in shown {
        let _ = writeln!(output, "• `{}`", suggestion.fullname);
    }
    output
}

/// Document table, optionally filtered by a case-insensitive substring of
/// the docname or title.
pub fn render_documents(index: &SearchIndex, filter: Option<&str>) -> String {
    let filter = filter.map(str::to_lowercase).filter(|f| !f.is_empty());
    let docs: Vec<_> = index
        .documents()
        .filter(|doc| {
            filter.as_deref().is_none_or(|f| {
                doc.docname.to_lowercase().contains(f) || doc.title.to_lowercase().contains(f)
            })
        })
        .collect();

    if docs.is_empty() {
        return match filter {
            Some(f) => format!("No documents match '{}'.\n", f),
            None => "The index contains no documents.\n".to_string(),
        };
    }

    let mut output = format!("Documents ({} of {}):\n\n", docs.len(), index.document_count());
    for doc in docs {
        let _ = writeln!(
            output,
            "{:>3}. {} (`{}`)",
            doc.index, doc.title, doc.filename
        );
    }
    output
}

/// Validation findings, errors first.
pub fn render_validation(path: &Path, stats: &IndexStats, report: &ValidationReport) -> String {
    let mut output = format!("Validation of {}\n{}\n\n", path.display(), render_stats(stats));
    if report.issues.is_empty() {
        output.push_str("✓ No issues found\n");
        return output;
    }

    let errors: Vec<_> = report.errors().collect();
    let warnings: Vec<_> = report.warnings().collect();
    if errors.is_empty() {
        let _ = writeln!(output, "✓ Valid ({} warnings)", warnings.len());
    } else {
        let _ = writeln!(
            output,
            "✗ Invalid: {} errors, {} warnings",
            errors.len(),
            warnings.len()
        );
    }
    for issue in errors.into_iter().chain(warnings) {
        let _ = writeln!(output, "  - {}: {}", issue.severity(), issue);
    }
    output
}
