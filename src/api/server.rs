use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use super::ApiResponse;
use crate::state::AppState;

/// Service health / 服务健康状态
#[derive(Debug, Serialize)]
pub struct HealthInfo {
    pub status: &'static str,
    pub version: &'static str,
    pub build_time: &'static str,
    pub backend: String,
    pub uptime_secs: i64,
}

/// 健康检查
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<ApiResponse<HealthInfo>> {
    let uptime = chrono::Utc::now() - state.started_at;
    Json(ApiResponse::success(HealthInfo {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        build_time: env!("BUILD_TIME"),
        backend: state.engine.backend_name().to_string(),
        uptime_secs: uptime.num_seconds(),
    }))
}
