//! Object lookup by name with fuzzy suggestions.

use crate::format::{render_object, render_suggestions};
use crate::worker::IndexState;
use rmcp::schemars;
use serde::Deserialize;

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LookupRequest {
    /// Object name: fully qualified ('ccc.utils.wavg') or short ('wavg')
    pub name: String,
    /// Index to search. Defaults to the active index.
    #[serde(default)]
    pub index: Option<String>,
    /// Maximum number of matches or suggestions to show (default: 5)
    #[serde(default = "default_limit")]
    pub limit: Option<usize>,
}

fn default_limit() -> Option<usize> {
    Some(5)
}

pub async fn handle_lookup(state: &IndexState, request: LookupRequest) -> Result<String, String> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err("Object name is empty".to_string());
    }

    let loaded = state
        .resolve(request.index.as_deref())
        .await
        .map_err(|e| e.to_string())?;
    let limit = request.limit.unwrap_or(5).max(1);
    let engine = state.engine();

    let matches = engine.find_objects(&loaded.index, name);
    if matches.is_empty() {
        let suggestions = engine.suggest_objects(&loaded.index, name, limit);
        return Ok(render_suggestions(name, &suggestions));
    }

    let mut output = String::new();
    if matches.len() > 1 {
        output.push_str(&format!("{} objects match '{}':\n\n", matches.len(), name));
    }
    for object in matches.iter().take(limit) {
        output.push_str(&render_object(&loaded.index, object));
        output.push('\n');
    }
    if matches.len() > limit {
        output.push_str(&format!("... and {} more\n", matches.len() - limit));
    }
    Ok(output)
}
