//! MCP server exposing the index tools.

use crate::tools::build::{BuildIndexRequest, handle_build_index};
use crate::tools::documents::{ListDocumentsRequest, handle_list_documents};
use crate::tools::lookup::{LookupRequest, handle_lookup};
use crate::tools::search::{SearchRequest, handle_search};
use crate::tools::set_index::{SetIndexRequest, handle_set_index};
use crate::tools::validate::{ValidateRequest, handle_validate};
use crate::worker::IndexState;
use rmcp::{
    ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::*,
    schemars::{self, JsonSchema, generate::SchemaSettings},
    tool, tool_handler, tool_router,
};
use std::sync::Arc;

/// MCP server for Sphinx search index queries
#[derive(Clone)]
pub struct IndexServer {
    /// Shared index state (config, loaded indexes, active index)
    state: Arc<IndexState>,

    /// Tool router for handling MCP tool calls
    tool_router: ToolRouter<Self>,
}

impl std::fmt::Debug for IndexServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexServer")
            .field("state", &self.state)
            .finish()
    }
}

#[tool_router]
impl IndexServer {
    pub fn new(state: Arc<IndexState>) -> Self {
        Self {
            state,
            tool_router: Self::tool_router(),
        }
    }

    pub fn state(&self) -> &Arc<IndexState> {
        &self.state
    }

    #[tool(
        description = "Load a Sphinx searchindex.js (or the HTML build directory containing it) and make it the default index for the other tools. Reports document, object and term counts.",
        input_schema = inline_schema_for_type::<SetIndexRequest>()
    )]
    async fn set_index(
        &self,
        Parameters(request): Parameters<SetIndexRequest>,
    ) -> std::result::Result<String, String> {
        handle_set_index(&self.state, request).await
    }

    #[tool(
        description = "Search the documentation index the way the site's search box does: API object names first, then pages whose titles and text contain every query word. Words are stemmed; prefix a word with '-' to exclude pages containing it.",
        input_schema = inline_schema_for_type::<SearchRequest>()
    )]
    async fn search_docs(
        &self,
        Parameters(request): Parameters<SearchRequest>,
    ) -> std::result::Result<String, String> {
        handle_search(&self.state, request).await
    }

    #[tool(
        description = "Look up an API object (module, class, function, method, attribute) by full or short name. Shows its type, page and URL, or close matches when the name is unknown.",
        input_schema = inline_schema_for_type::<LookupRequest>()
    )]
    async fn lookup_object(
        &self,
        Parameters(request): Parameters<LookupRequest>,
    ) -> std::result::Result<String, String> {
        handle_lookup(&self.state, request).await
    }

    #[tool(
        description = "List the pages of the documentation index with their titles and source files, optionally filtered by text.",
        input_schema = inline_schema_for_type::<ListDocumentsRequest>()
    )]
    async fn list_documents(
        &self,
        Parameters(request): Parameters<ListDocumentsRequest>,
    ) -> std::result::Result<String, String> {
        handle_list_documents(&self.state, request).await
    }

    #[tool(
        description = "Check a search index for structural problems: misaligned document tables, out-of-range document references, unknown object types and unsorted postings.",
        input_schema = inline_schema_for_type::<ValidateRequest>()
    )]
    async fn validate_index(
        &self,
        Parameters(request): Parameters<ValidateRequest>,
    ) -> std::result::Result<String, String> {
        handle_validate(&self.state, request).await
    }

    #[tool(
        description = "Build a searchindex.js from a documentation source directory of reStructuredText, Markdown and text pages, including Python object directives.",
        input_schema = inline_schema_for_type::<BuildIndexRequest>()
    )]
    async fn build_index(
        &self,
        Parameters(request): Parameters<BuildIndexRequest>,
    ) -> std::result::Result<String, String> {
        let output = request.output.clone();
        let response = handle_build_index(request).await?;
        // A rebuilt file must not be served from a stale cache entry
        if let Ok(path) = std::fs::canonicalize(&output) {
            self.state.evict(&path).await;
            self.state.evict(&path.join("searchindex.js")).await;
        }
        Ok(response)
    }
}

#[tool_handler]
impl ServerHandler for IndexServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo::new(ServerCapabilities::builder().enable_tools().build())
            .with_protocol_version(ProtocolVersion::V_2024_11_05)
            .with_server_info(Implementation::from_build_env())
            .with_instructions(
                "sphinx-index-mcp: Query Sphinx documentation search indexes (searchindex.js). \
                 Use set_index to choose an index, then search_docs, lookup_object and \
                 list_documents. validate_index checks an index; build_index creates one \
                 from documentation sources."
                    .to_string(),
            )
    }
}

/// Generate an inline JSON schema for MCP tools
///
/// Unlike rmcp's default `schema_for_type()`, this sets `inline_subschemas = true`
/// so nested types are written inline instead of as `$ref` definitions.
pub fn inline_schema_for_type<T: JsonSchema>() -> Arc<JsonObject> {
    let mut settings = SchemaSettings::draft07();
    settings.transforms = vec![Box::new(schemars::transform::AddNullable::default())];
    settings.inline_subschemas = true;

    let generator = settings.into_generator();
    let schema = generator.into_root_schema_for::<T>();
    let json_object = match serde_json::to_value(schema) {
        Ok(serde_json::Value::Object(object)) => object,
        Ok(_) | Err(_) => {
            tracing::error!("Schema serialization did not produce an object");
            JsonObject::new()
        }
    };

    Arc::new(json_object)
}
