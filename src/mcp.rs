use std::sync::Arc;

use rmcp::{
    ServerHandler,
    ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{
        CallToolResult,
        Content,
        Implementation,
        ServerCapabilities,
        ServerInfo,
    },
    tool,
    tool_handler,
    tool_router,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    error::{self, Error},
    search::{DocCache, SearchResult},
};

const DEFAULT_SEARCH_LIMIT: i64 = 5;

#[derive(Clone)]
pub struct DocsiftMcpServer {
    cache: Arc<DocCache>,
    tool_router: ToolRouter<Self>,
}

impl DocsiftMcpServer {
    pub fn new(cache: Arc<DocCache>) -> Self {
        Self {
            cache,
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router(router = tool_router)]
impl DocsiftMcpServer {
    /// Search the indexed documentation sections with TF-IDF similarity.
    #[tool(
        name = "search_markdown",
        description = "Search the documentation for a query using TF-IDF similarity. Returns matched sections with their full markdown content and a relevance score."
    )]
    pub async fn search_markdown(
        &self,
        params: Parameters<SearchParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let params = params.0;
        let limit = params.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
        let results = self.cache.search(&params.query, limit);

        let summary = format_search_summary(&results, &params.query);
        let structured = serde_json::to_value(SearchResponse {
            result_count: results.len(),
            query: params.query,
            results,
        })
        .map_err(|e| mcp_error("failed to serialize search results", e))?;

        let mut result = CallToolResult::success(vec![Content::text(summary)]);
        result.structured_content = Some(structured);
        Ok(result)
    }
}

#[tool_handler(router = self.tool_router)]
impl ServerHandler for DocsiftMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo::new(ServerCapabilities::builder().enable_tools().build())
            .with_server_info(
                Implementation::new("docsift", env!("CARGO_PKG_VERSION"))
                    .with_title("docsift documentation search"),
            )
            .with_instructions(
                "Use search_markdown to find documentation sections by keyword. Queries are English bag-of-words.",
            )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    /// Query string to search.
    pub query: String,
    /// Maximum number of results (default: 5).
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    query: String,
    result_count: usize,
    results: Vec<SearchResult>,
}

fn format_search_summary(results: &[SearchResult], query: &str) -> String {
    if results.is_empty() {
        return format!("No results found for \"{query}\"");
    }

    let mut lines = Vec::with_capacity(results.len() + 1);
    let suffix = if results.len() == 1 { "" } else { "s" };
    lines.push(format!(
        "Found {} result{} for \"{query}\":",
        results.len(),
        suffix
    ));

    for r in results {
        lines.push(format!("{:.3} {}", r.score, r.file));
    }

    lines.join("\n")
}

fn mcp_error(message: &str, error: impl std::fmt::Display) -> rmcp::ErrorData {
    rmcp::ErrorData::internal_error(
        message.to_string(),
        Some(json!({ "error": error.to_string() })),
    )
}

/// Serve the MCP tool over stdio until the client disconnects.
pub fn run_mcp(cache: DocCache) -> error::Result<()> {
    let server = DocsiftMcpServer::new(Arc::new(cache));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| {
            Error::Server(format!("failed to start tokio runtime: {e}"))
        })?;

    runtime.block_on(async move {
        let transport = rmcp::transport::stdio();
        let running = server.serve(transport).await.map_err(|e| {
            Error::Server(format!("MCP server initialization failed: {e}"))
        })?;
        running
            .waiting()
            .await
            .map_err(|e| Error::Server(format!("MCP server error: {e}")))?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::corpus::{Corpus, Document};

    fn server() -> DocsiftMcpServer {
        let corpus = Corpus::from_documents([
            Document {
                identity: "guide/ownership.md".to_string(),
                text: "# Ownership\nOwnership keeps memory safe.".to_string(),
            },
            Document {
                identity: "guide/traits.md".to_string(),
                text: "# Traits\nTraits describe shared behaviour.".to_string(),
            },
        ]);
        let cache = DocCache::from_corpus(Path::new("/data"), corpus);
        DocsiftMcpServer::new(Arc::new(cache))
    }

    #[tokio::test]
    async fn search_tool_returns_structured_results() {
        let params = SearchParams {
            query: "memory ownership".to_string(),
            limit: Some(3),
        };

        let result = server().search_markdown(Parameters(params)).await.unwrap();

        let structured = result.structured_content.expect("structured");
        assert_eq!(structured["resultCount"], 1);
        let first = &structured["results"][0];
        assert_eq!(first["file"], "guide/ownership.md");
        assert!(first["content"].as_str().unwrap().contains("memory safe"));
        assert!(first["score"].as_f64().unwrap() > 0.0);

        let summary = result
            .content
            .first()
            .and_then(|c| c.as_text())
            .map(|t| t.text.clone())
            .unwrap_or_default();
        assert!(summary.contains("Found 1 result for \"memory ownership\""));
        assert!(summary.contains("guide/ownership.md"));
    }

    #[tokio::test]
    async fn search_tool_reports_no_results() {
        let params = SearchParams {
            query: "xyzzy".to_string(),
            limit: None,
        };

        let result = server().search_markdown(Parameters(params)).await.unwrap();

        let structured = result.structured_content.expect("structured");
        assert_eq!(structured["resultCount"], 0);
        let summary = result
            .content
            .first()
            .and_then(|c| c.as_text())
            .map(|t| t.text.clone())
            .unwrap_or_default();
        assert_eq!(summary, "No results found for \"xyzzy\"");
    }
}
