//! Structural consistency report for an index.

use crate::format::render_validation;
use crate::index::validate;
use crate::worker::IndexState;
use rmcp::schemars;
use serde::Deserialize;

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ValidateRequest {
    /// Index to check. Defaults to the active index.
    #[serde(default)]
    pub index: Option<String>,
}

pub async fn handle_validate(state: &IndexState, request: ValidateRequest) -> Result<String, String> {
    let loaded = state
        .resolve(request.index.as_deref())
        .await
        .map_err(|e| e.to_string())?;
    let report = validate(&loaded.index);
    if !report.is_valid() {
        tracing::warn!(
            "Index {} failed validation with {} errors",
            loaded.path.display(),
            report.errors().count()
        );
    }
    Ok(render_validation(
        &loaded.path,
        &loaded.index.stats(),
        &report,
    ))
}
