use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::config::SearchConfig;
use crate::search::SearchEngine;
use crate::storage::CatalogStore;

/// Shared application state / 应用共享状态
pub struct AppState {
    pub engine: SearchEngine,
    pub search_config: SearchConfig,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(store: Arc<dyn CatalogStore>, search_config: SearchConfig) -> Self {
        Self {
            engine: SearchEngine::new(store),
            search_config,
            started_at: Utc::now(),
        }
    }
}
