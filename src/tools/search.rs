//! Ranked full-text and object search.

use crate::format::render_search_results;
use crate::worker::IndexState;
use rmcp::schemars;
use serde::Deserialize;

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchRequest {
    /// Search query. Words prefixed with '-' exclude pages containing them.
    pub query: String,
    /// Index to search. Defaults to the active index.
    #[serde(default)]
    pub index: Option<String>,
    /// Maximum number of results to return (default: from config, usually 10)
    #[serde(default)]
    pub limit: Option<usize>,
}

pub async fn handle_search(state: &IndexState, request: SearchRequest) -> Result<String, String> {
    if request.query.trim().is_empty() {
        return Err("Query is empty".to_string());
    }

    let loaded = state
        .resolve(request.index.as_deref())
        .await
        .map_err(|e| e.to_string())?;
    let limit = state.config().search.effective_limit(request.limit);

    let results = state.engine().search(&loaded.index, &request.query, limit);
    tracing::debug!(
        "Search '{}' in {}: {} results",
        request.query,
        loaded.path.display(),
        results.len()
    );
    Ok(render_search_results(&request.query, &results))
}
