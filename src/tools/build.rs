//! Builds a searchindex.js from a documentation source tree.

use crate::build::source::build_from_dir;
use crate::config::expand_tilde;
use crate::error::Result;
use crate::format::render_stats;
use crate::index::{IndexStats, jsdump, validate};
use anyhow::anyhow;
use rmcp::schemars;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct BuildIndexRequest {
    /// Documentation source directory (.rst, .md and .txt pages)
    pub source: String,
    /// Output file path, or a directory to write searchindex.js into
    pub output: String,
}

/// Build and write an index, returning where it went and its counts.
pub fn build_index(source: &Path, output: &Path) -> Result<(PathBuf, IndexStats)> {
    let source = expand_tilde(source);
    if !source.is_dir() {
        return Err(anyhow!("Source is not a directory: {}", source.display()));
    }
    let output = expand_tilde(output);
    let output = if output.is_dir() {
        output.join("searchindex.js")
    } else {
        output
    };

    let index = build_from_dir(&source)?;
    let report = validate(&index);
    if !report.is_valid() {
        return Err(anyhow!(
            "Built index failed validation: {}",
            report
                .errors()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ")
        ));
    }

    jsdump::write(&output, &index)?;
    Ok((output, index.stats()))
}

pub async fn handle_build_index(request: BuildIndexRequest) -> std::result::Result<String, String> {
    let source = PathBuf::from(request.source.trim());
    let output = PathBuf::from(request.output.trim());

    let (path, stats) = tokio::task::spawn_blocking(move || build_index(&source, &output))
        .await
        .map_err(|e| format!("Build task failed: {}", e))?
        .map_err(|e| format!("Failed to build index: {:#}", e))?;

    tracing::info!("Wrote search index {}", path.display());
    Ok(format!(
        "Search index written: {}\n\n{}\n",
        path.display(),
        render_stats(&stats)
    ))
}
