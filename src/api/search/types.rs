use serde::{Deserialize, Serialize};

use crate::search::SearchHit;

/// Query string of `GET /search/items` / 搜索请求参数
///
/// Kept as raw strings so bad values get a JSON 400 instead of a plain-text rejection.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub limit: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub op: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub items: Vec<SearchHit>,
}
