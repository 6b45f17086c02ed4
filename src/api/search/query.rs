use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use super::types::*;
use crate::api::ApiResponse;
use crate::config::SearchConfig;
use crate::search::{BooleanOp, SearchError, SearchMode};
use crate::state::AppState;

type SearchReply = (StatusCode, Json<ApiResponse<SearchResponse>>);

/// Validated request / 校验后的请求
#[derive(Debug, PartialEq)]
struct SearchRequest {
    query: String,
    limit: usize,
    mode: SearchMode,
    op: BooleanOp,
}

fn bad_request(message: &str) -> SearchReply {
    (StatusCode::BAD_REQUEST, Json(ApiResponse::error(message)))
}

fn validate(params: SearchParams, config: &SearchConfig) -> Result<SearchRequest, SearchReply> {
    let query = params.q.as_deref().map(str::trim).unwrap_or_default();
    if query.is_empty() {
        return Err(bad_request("Query parameter 'q' is required"));
    }

    let max_limit = config.effective_max_limit();
    let limit = match params.limit.as_deref().map(str::trim) {
        None | Some("") => config.default_limit.clamp(1, max_limit.max(1)),
        Some(raw) => match raw.parse::<usize>() {
            Ok(n) if (1..=max_limit).contains(&n) => n,
            _ => {
                return Err(bad_request(&format!(
                    "limit must be an integer between 1 and {}",
                    max_limit
                )))
            }
        },
    };

    let mode = match params.mode.as_deref() {
        None | Some("") => SearchMode::default(),
        Some(raw) => raw.parse().map_err(|e: String| bad_request(&e))?,
    };
    let op = match params.op.as_deref() {
        None | Some("") => BooleanOp::default(),
        Some(raw) => raw.parse().map_err(|e: String| bad_request(&e))?,
    };

    Ok(SearchRequest {
        query: query.to_string(),
        limit,
        mode,
        op,
    })
}

/// 商品搜索
pub async fn search_items(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> SearchReply {
    let req = match validate(params, &state.search_config) {
        Ok(req) => req,
        Err(reply) => return reply,
    };

    match state.engine.search(&req.query, req.limit, req.mode, req.op).await {
        Ok(items) => (StatusCode::OK, Json(ApiResponse::success(SearchResponse { items }))),
        Err(e @ SearchError::CapabilityUnavailable { .. }) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiResponse::error_with_code(503, &e.to_string())),
        ),
        Err(e @ SearchError::Backend(_)) => {
            tracing::error!("Search failed for {:?}: {}", req.query, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error_with_code(500, &e.to_string())),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::router;
    use crate::storage::sqlite::tests::{memory_catalog, scenario_items};
    use crate::storage::SqliteCatalog;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    fn params(q: &str, limit: Option<&str>, mode: Option<&str>, op: Option<&str>) -> SearchParams {
        SearchParams {
            q: Some(q.to_string()),
            limit: limit.map(String::from),
            mode: mode.map(String::from),
            op: op.map(String::from),
        }
    }

    #[test]
    fn test_validate_defaults() {
        let config = SearchConfig::default();
        let req = validate(params("  red  ", None, None, None), &config).unwrap();
        assert_eq!(
            req,
            SearchRequest {
                query: "red".to_string(),
                limit: 50,
                mode: SearchMode::Auto,
                op: BooleanOp::And,
            }
        );
    }

    #[test]
    fn test_validate_rejects_bad_input() {
        let config = SearchConfig::default();
        assert!(validate(SearchParams::default(), &config).is_err());
        assert!(validate(params("   ", None, None, None), &config).is_err());
        for limit in ["0", "201", "-3", "ten"] {
            let (status, _) = validate(params("red", Some(limit), None, None), &config).unwrap_err();
            assert_eq!(status, StatusCode::BAD_REQUEST);
        }
        assert!(validate(params("red", None, Some("fuzzy"), None), &config).is_err());
        assert!(validate(params("red", None, None, Some("xor")), &config).is_err());

        let req = validate(params("red", Some("200"), Some("like"), Some("or")), &config).unwrap();
        assert_eq!(req.limit, 200);
        assert_eq!(req.mode, SearchMode::Fallback);
        assert_eq!(req.op, BooleanOp::Or);
    }

    #[test]
    fn test_validate_clamps_configured_max_limit() {
        let config = SearchConfig {
            max_limit: 1000,
            default_limit: 500,
            ..Default::default()
        };
        let (status, Json(body)) = validate(params("red", Some("201"), None, None), &config).unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.message.contains("between 1 and 200"));
        assert_eq!(validate(params("red", Some("200"), None, None), &config).unwrap().limit, 200);
        assert_eq!(validate(params("red", None, None, None), &config).unwrap().limit, 200);
    }

    async fn app(store: SqliteCatalog) -> axum::Router {
        store.upsert_items(&scenario_items()).await.unwrap();
        router(Arc::new(AppState::new(Arc::new(store), SearchConfig::default())))
    }

    async fn get(app: axum::Router, uri: &str) -> (StatusCode, Value) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_search_items_fallback() {
        let app = app(memory_catalog(false).await).await;
        let (status, body) = get(app, "/search/items?q=red&mode=fallback&op=OR").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["code"], 200);
        let items = body["data"]["items"].as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["id"], "A");
        assert!(items[0].get("score").is_none());
    }

    #[tokio::test]
    async fn test_search_items_ranked_has_scores() {
        let app = app(memory_catalog(true).await).await;
        let (status, body) = get(app, "/search/items?q=%22running%20shoes%22&limit=5").await;
        assert_eq!(status, StatusCode::OK);
        let items = body["data"]["items"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["id"], "A");
        assert!(items[0]["score"].is_number());
    }

    #[tokio::test]
    async fn test_search_items_validation() {
        let app = app(memory_catalog(true).await).await;
        let (status, body) = get(app.clone(), "/search/items?q=%20%20").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], 400);
        let (status, _) = get(app, "/search/items?q=red&limit=500").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_search_items_forced_ranked_unavailable() {
        let app = app(memory_catalog(false).await).await;
        let (status, body) = get(app, "/search/items?q=red&mode=ranked").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["code"], 503);
    }

    #[tokio::test]
    async fn test_search_items_backend_failure() {
        let store = memory_catalog(false).await;
        store.upsert_items(&scenario_items()).await.unwrap();
        store.close().await;
        let app = router(Arc::new(AppState::new(Arc::new(store), SearchConfig::default())));
        let (status, body) = get(app, "/search/items?q=red").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], 500);
    }

    #[tokio::test]
    async fn test_health() {
        let app = app(memory_catalog(true).await).await;
        let (status, body) = get(app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["backend"], "sqlite");
        assert_eq!(body["data"]["version"], env!("CARGO_PKG_VERSION"));
    }
}
