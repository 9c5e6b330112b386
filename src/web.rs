//! HTTP front-end over a loaded [`DocCache`].

use std::{collections::BTreeMap, net::SocketAddr, sync::Arc};

use axum::{
    Json,
    Router,
    extract::{Query, State},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::{
    error::{Error, Result},
    links::{LinkConfig, relevance_label},
    search::DocCache,
};

const DEFAULT_SEARCH_LIMIT: i64 = 10;

#[derive(Clone)]
struct AppState {
    cache: Arc<DocCache>,
    links: Arc<LinkConfig>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Query string; only English queries are supported.
    pub query: String,
    /// Maximum number of results (default: 10).
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct WebSearchResult {
    pub file: String,
    /// Documentation URLs keyed by site label.
    pub urls: BTreeMap<String, String>,
    /// Full content of the matched section in markdown.
    pub content: String,
    pub score: f64,
    pub relevance: String,
}

/// Build the router: `POST /search` and `GET /ping`, CORS open to all.
pub fn router(cache: Arc<DocCache>, links: LinkConfig) -> Router {
    let state = AppState {
        cache,
        links: Arc::new(links),
    };

    Router::new()
        .route("/search", post(search_docs))
        .route("/ping", get(ping))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn search_docs(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Json<Vec<WebSearchResult>> {
    let limit = params.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
    let results = state
        .cache
        .search(&params.query, limit)
        .into_iter()
        .map(|r| WebSearchResult {
            urls: state.links.urls_for(&r.file),
            relevance: relevance_label(r.score).to_string(),
            file: r.file,
            content: r.content,
            score: r.score,
        })
        .collect();
    Json(results)
}

async fn ping() -> &'static str {
    "OK"
}

/// Serve the HTTP API until the process is stopped.
pub fn run_server(
    addr: SocketAddr,
    cache: DocCache,
    links: LinkConfig,
    server_url: Option<&str>,
) -> Result<()> {
    info!(
        root = %cache.root().display(),
        documents = cache.len(),
        "loaded documentation"
    );
    let app = router(Arc::new(cache), links);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| {
            Error::Server(format!("failed to start tokio runtime: {e}"))
        })?;

    runtime.block_on(async move {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!(
            addr = %listener.local_addr()?,
            public_url = server_url.unwrap_or("http://localhost"),
            "serving search API"
        );
        axum::serve(listener, app)
            .await
            .map_err(|e| Error::Server(format!("HTTP server error: {e}")))
    })
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use tower::ServiceExt;

    use super::*;
    use crate::{
        corpus::{Corpus, Document},
        links::LinkSpec,
    };

    fn app() -> Router {
        let corpus = Corpus::from_documents([
            Document {
                identity: "en-us/tutorial/shapes/circle.md".to_string(),
                text: "# Shapes\n## Circle\nDraw a circle.".to_string(),
            },
            Document {
                identity: "en-us/tutorial/audio/play.md".to_string(),
                text: "# Audio\n## Play\nPlay a sound.".to_string(),
            },
        ]);
        let cache = DocCache::from_corpus(Path::new("/data"), corpus);
        let anchored: Vec<LinkSpec> =
            vec!["en=https://docs.example.org/en".parse().unwrap()];
        let pages: Vec<LinkSpec> =
            vec!["ja=https://docs.example.org/ja".parse().unwrap()];
        router(Arc::new(cache), LinkConfig::new(&anchored, &pages))
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn ping_returns_ok() {
        let response = app()
            .oneshot(Request::get("/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "OK");
    }

    #[tokio::test]
    async fn search_returns_linked_results() {
        let response = app()
            .oneshot(
                Request::post("/search?query=circle&limit=5")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let results: Vec<WebSearchResult> =
            serde_json::from_str(&body_string(response).await).unwrap();

        assert_eq!(results.len(), 1);
        let hit = &results[0];
        assert_eq!(hit.file, "en-us/tutorial/shapes/circle.md");
        assert_eq!(
            hit.urls["en"],
            "https://docs.example.org/en/en-us/tutorial/shapes#circle"
        );
        assert_eq!(
            hit.urls["ja"],
            "https://docs.example.org/ja/en-us/tutorial/shapes"
        );
        assert!(hit.content.contains("Draw a circle."));
        assert!(hit.score > 0.0);
        assert_eq!(hit.relevance, relevance_label(hit.score));
    }

    #[tokio::test]
    async fn non_positive_limit_returns_empty_list() {
        let response = app()
            .oneshot(
                Request::post("/search?query=circle&limit=0")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "[]");
    }

    #[tokio::test]
    async fn missing_query_is_rejected() {
        let response = app()
            .oneshot(Request::post("/search").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn cors_allows_any_origin() {
        let response = app()
            .oneshot(
                Request::get("/ping")
                    .header(header::ORIGIN, "https://elsewhere.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(
            response
                .headers()
                .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        );
    }
}
