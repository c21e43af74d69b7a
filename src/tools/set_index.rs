//! Selects the index used by requests that name none.

use crate::format::render_set_index;
use crate::worker::IndexState;
use rmcp::schemars;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SetIndexRequest {
    /// Path to a searchindex.js file, or to the HTML build directory containing it
    pub path: String,
}

/// Load the index and make it the active one.
pub async fn handle_set_index(state: &IndexState, request: SetIndexRequest) -> Result<String, String> {
    let path = PathBuf::from(request.path.trim());
    let (previous, loaded) = state
        .set_active(&path)
        .await
        .map_err(|e| format!("Failed to set index: {}", e))?;

    Ok(render_set_index(
        &loaded.path,
        &loaded.index,
        previous.as_deref(),
    ))
}
