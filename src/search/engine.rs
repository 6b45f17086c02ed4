//! Search dispatcher - parse, negotiate, build, execute, cap / 搜索调度
//!
//! Holds no state besides the store handle; one call never affects another.

use std::sync::Arc;

use super::builder::{RankedIndexBuilder, SubstringBuilder, VectorTextBuilder};
use super::error::SearchResult;
use super::negotiator::choose;
use super::schema::{BooleanOp, MatchExpression, ResolvedPath, SearchHit, SearchMode};
use super::tokenizer::parse;
use crate::storage::CatalogStore;

/// Search engine over one catalog store / 搜索引擎
pub struct SearchEngine {
    store: Arc<dyn CatalogStore>,
}

impl SearchEngine {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// Active backend name / 当前后端名称
    pub fn backend_name(&self) -> &str {
        self.store.name()
    }

    /// Run one search / 执行搜索
    ///
    /// Ranked paths keep the store's order and scores. The fallback path keeps
    /// the store's native row order; there is no score to sort by.
    pub async fn search(
        &self,
        raw: &str,
        limit: usize,
        mode: SearchMode,
        op: BooleanOp,
    ) -> SearchResult<Vec<SearchHit>> {
        let query = parse(raw);
        if query.is_empty() {
            tracing::debug!("Empty query after parsing: {:?}", raw);
            return Ok(Vec::new());
        }

        // The probe cannot change a forced fallback
        let ranked_available = match mode {
            SearchMode::Fallback => false,
            _ => self.store.probe_ranked_capability().await,
        };

        let path = choose(mode, ranked_available, self.store.ranked_backend(), self.store.name())
            .map_err(|e| {
                tracing::warn!("Search refused: {}", e);
                e
            })?;

        if mode == SearchMode::Auto && !path.is_ranked() {
            tracing::info!("Ranked search unavailable on {}, using substring fallback", self.store.name());
        }

        let mut hits = match path {
            ResolvedPath::RankedIndex => self.run_ranked(RankedIndexBuilder::build(&query), limit).await?,
            ResolvedPath::VectorText => self.run_ranked(VectorTextBuilder::build(&query), limit).await?,
            ResolvedPath::SubstringFallback => {
                let filter = SubstringBuilder::build(&query, op);
                if filter.is_empty() {
                    return Ok(Vec::new());
                }
                let keywords: Vec<&str> = filter
                    .groups
                    .iter()
                    .flat_map(|g| g.blocks.iter().map(|b| b.keyword.as_str()))
                    .collect();
                tracing::debug!("Substring keywords {:?} joined with {}", keywords, op.as_sql());
                self.store
                    .execute_substring(&filter, limit)
                    .await
                    .map_err(|e| {
                        tracing::warn!("Substring search failed on {}: {}", self.store.name(), e);
                        e
                    })?
                    .into_iter()
                    .map(SearchHit::unranked)
                    .collect()
            }
        };

        hits.truncate(limit);
        tracing::debug!(
            path = ?path,
            mode = mode.as_str(),
            hits = hits.len(),
            "search {:?}",
            raw
        );
        Ok(hits)
    }

    async fn run_ranked(&self, expression: MatchExpression, limit: usize) -> SearchResult<Vec<SearchHit>> {
        // Never "no filter": nothing to match means nothing found
        if expression.is_empty() {
            return Ok(Vec::new());
        }

        let hits = self
            .store
            .execute_ranked(&expression, limit)
            .await
            .map_err(|e| {
                tracing::warn!("Ranked search failed on {}: {}", self.store.name(), e);
                e
            })?;
        Ok(hits)
    }
}
