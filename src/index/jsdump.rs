//! Reading and writing the `Search.setIndex(...)` payload.
//!
//! The generator emits a JavaScript object literal rather than strict JSON:
//! keys that are plain identifiers (and not reserved words) are written
//! without quotes. Parsing quotes those keys and hands the result to
//! `serde_json`; dumping reproduces the generator's compact, sorted form.

use crate::error::IndexError;
use crate::index::SearchIndex;
use anyhow::Context;
use serde_json::Value;
use std::fmt::Write as _;
use std::path::Path;

const WRAPPER_OPEN: &str = "Search.setIndex(";

/// JavaScript reserved words; keys matching one are always quoted.
const RESERVED_WORDS: &[&str] = &[
    "abstract", "boolean", "break", "byte", "case", "catch", "char", "class", "const",
    "continue", "debugger", "default", "delete", "do", "double", "else", "enum", "export",
    "extends", "false", "final", "finally", "float", "for", "function", "goto", "if",
    "implements", "import", "in", "instanceof", "int", "interface", "long", "native", "new",
    "null", "package", "private", "protected", "public", "return", "short", "static", "super",
    "switch", "synchronized", "this", "throw", "throws", "transient", "true", "try", "typeof",
    "var", "void", "volatile", "while", "with",
];

/// Decode a search index from `searchindex.js` text or plain JSON.
pub fn parse(text: &str) -> Result<SearchIndex, IndexError> {
    let payload = extract_payload(text)?;
    let json = quote_bare_keys(payload);
    let index = serde_json::from_str(&json)?;
    Ok(index)
}

/// Encode a search index in the generator's canonical `searchindex.js` form.
pub fn dump(index: &SearchIndex) -> Result<String, IndexError> {
    let mut value = serde_json::to_value(index).map_err(|e| IndexError::Encode(e.to_string()))?;

    // Optional sections that are absent are left out entirely
    if let Value::Object(map) = &mut value {
        map.retain(|_, v| !v.is_null());
    }

    let mut out = String::with_capacity(64 * 1024);
    out.push_str(WRAPPER_OPEN);
    write_value(&value, &mut out);
    out.push(')');
    Ok(out)
}

/// Read and decode an index file.
pub fn load(path: &Path) -> crate::error::Result<SearchIndex> {
    let text = std::fs::read_to_string(path).map_err(|e| IndexError::io(path, e))?;
    parse(&text).with_context(|| format!("Failed to parse search index {}", path.display()))
}

/// Encode and write an index file, creating parent directories if needed.
pub fn write(path: &Path, index: &SearchIndex) -> crate::error::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    let text = dump(index)?;
    std::fs::write(path, text).map_err(|e| IndexError::io(path, e))?;
    tracing::debug!("Wrote search index to {}", path.display());
    Ok(())
}

/// Strips the `Search.setIndex(...)` wrapper, if present.
fn extract_payload(text: &str) -> Result<&str, IndexError> {
    let trimmed = text.trim();
    let inner = match trimmed.find(WRAPPER_OPEN) {
        Some(start) => {
            let rest = &trimmed[start + WRAPPER_OPEN.len()..];
            let rest = rest.trim_end().trim_end_matches(';').trim_end();
            rest.strip_suffix(')').ok_or(IndexError::MissingPayload)?
        }
        None => trimmed,
    };

    let inner = inner.trim();
    if inner.starts_with('{') && inner.ends_with('}') {
        Ok(inner)
    } else {
        Err(IndexError::MissingPayload)
    }
}

/// Rewrites bare identifier keys as JSON strings, leaving string literals
/// and bare values (`true`, `null`, ...) untouched.
fn quote_bare_keys(payload: &str) -> String {
    let mut out = String::with_capacity(payload.len() + payload.len() / 8);
    let mut chars = payload.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if c == '"' {
            out.push(c);
            let mut escaped = false;
            for (_, s) in chars.by_ref() {
                out.push(s);
                if escaped {
                    escaped = false;
                } else if s == '\\' {
                    escaped = true;
                } else if s == '"' {
                    break;
                }
            }
        } else if c.is_alphabetic() || c == '_' || c == '$' {
            let mut end = i + c.len_utf8();
            while let Some(&(j, n)) = chars.peek() {
                if n.is_alphanumeric() || n == '_' || n == '$' {
                    end = j + n.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            let ident = &payload[i..end];
            let is_key = payload[end..].trim_start().starts_with(':');
            if is_key {
                out.push('"');
                out.push_str(ident);
                out.push('"');
            } else {
                out.push_str(ident);
            }
        } else {
            out.push(c);
        }
    }

    out
}

fn is_bare_key(key: &str) -> bool {
    let mut chars = key.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    valid && !RESERVED_WORDS.contains(&key)
}

fn write_string(s: &str, out: &mut String) {
    // serde_json never fails to encode a str
    match serde_json::to_string(s) {
        Ok(encoded) => out.push_str(&encoded),
        Err(_) => out.push_str("\"\""),
    }
}

fn write_value(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => {
            let _ = write!(out, "{}", n);
        }
        Value::String(s) => write_string(s, out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            // The generator sorts the rendered `key:value` pairs, not the keys
            let mut pairs: Vec<String> = map
                .iter()
                .map(|(key, item)| {
                    let mut pair = String::new();
                    if is_bare_key(key) {
                        pair.push_str(key);
                    } else {
                        write_string(key, &mut pair);
                    }
                    pair.push(':');
                    write_value(item, &mut pair);
                    pair
                })
                .collect();
            pairs.sort_unstable();
            out.push('{');
            out.push_str(&pairs.join(","));
            out.push('}');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::{check, let_assert};
    use rstest::rstest;

    const MINIMAL: &str = r#"Search.setIndex({docnames:["index","api"],envversion:{"sphinx.domains.python":3,sphinx:56},filenames:["index.rst","api.rst"],objects:{"":[[1,0,0,"-","pkg"]]},objnames:{"0":["py","module","Python module"]},objtypes:{"0":"py:module"},terms:{"class":1,"function":[0,1],The:0,pkg:1},titles:["Home","API"],titleterms:{api:1,home:0}})"#;

    #[test]
    fn test_parse_minimal() {
        let_assert!(Ok(index) = parse(MINIMAL));
        check!(index.docnames == ["index", "api"]);
        check!(index.envversion["sphinx"] == 56);
        check!(index.terms["function"].docs() == [0, 1]);
        check!(index.terms["The"].docs() == [0]);
        check!(index.objects[""][0].anchor == "-");
    }

    #[test]
    fn test_dump_matches_generator_form() {
        let index = parse(MINIMAL).unwrap();
        let_assert!(Ok(text) = dump(&index));
        check!(text == MINIMAL);
    }

    #[rstest]
    #[case("Search.setIndex({docnames:[],filenames:[]});\n")]
    #[case("  {\"docnames\":[],\"filenames\":[]}  ")]
    #[case("Search.setIndex( {docnames:[],filenames:[]} )")]
    fn test_payload_forms(#[case] input: &str) {
        let_assert!(Ok(index) = parse(input));
        check!(index.docnames.is_empty());
    }

    #[rstest]
    #[case("")]
    #[case("Search.setIndex(")]
    #[case("var x = 1;")]
    fn test_missing_payload(#[case] input: &str) {
        let_assert!(Err(IndexError::MissingPayload) = parse(input));
    }

    #[test]
    fn test_malformed_payload_reports_position() {
        let_assert!(Err(IndexError::Malformed { line, .. }) = parse("{docnames:[1,,2]}"));
        check!(line == 1);
    }

    #[test]
    fn test_strings_with_colons_are_untouched() {
        let quoted = quote_bare_keys(r#"{titles:["Note: a,b:c", "say \"hi\": x"],n:null}"#);
        check!(quoted == r#"{"titles":["Note: a,b:c", "say \"hi\": x"],"n":null}"#);
    }

    #[rstest]
    #[case("docnames", true)]
    #[case("_private", true)]
    #[case("class", false)]
    #[case("0", false)]
    #[case("get_taxcalc_rates", true)]
    #[case("ccc.utils", false)]
    #[case("", false)]
    fn test_bare_key_rules(#[case] key: &str, #[case] expected: bool) {
        check!(is_bare_key(key) == expected);
    }
}
