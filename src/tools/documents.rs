//! Lists the pages of an index.

use crate::format::render_documents;
use crate::worker::IndexState;
use rmcp::schemars;
use serde::Deserialize;

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListDocumentsRequest {
    /// Index to list. Defaults to the active index.
    #[serde(default)]
    pub index: Option<String>,
    /// Only show documents whose docname or title contains this text
    #[serde(default)]
    pub filter: Option<String>,
}

pub async fn handle_list_documents(
    state: &IndexState,
    request: ListDocumentsRequest,
) -> Result<String, String> {
    let loaded = state
        .resolve(request.index.as_deref())
        .await
        .map_err(|e| e.to_string())?;
    Ok(render_documents(&loaded.index, request.filter.as_deref()))
}
