//! Catalog storage collaborators - execute match expressions, return rows / 商品存储
//!
//! The search engine only sees the `CatalogStore` trait. Each store owns its
//! connection pool, schema bootstrap and query timeout.

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::{BackendKind, DatabaseConfig, SearchConfig};
use crate::models::CatalogItem;
use crate::search::schema::{MatchExpression, RankedBackend, SearchField, SearchHit, SubstringFilter};

pub mod postgres;
pub mod sqlite;

pub use postgres::PgCatalog;
pub use sqlite::SqliteCatalog;

/// Storage errors / 存储错误
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("query timed out after {0:?}")]
    Timeout(Duration),
}

/// Storage interface used by the search engine (primitive operations only) / 存储接口
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Backend name, used in logs and errors / 后端名称
    fn name(&self) -> &str;

    /// Ranked engine this store would use when available / 排序引擎类型
    fn ranked_backend(&self) -> RankedBackend;

    /// Cheap, idempotent check for ranked search support / 检查是否支持排序搜索
    async fn probe_ranked_capability(&self) -> bool;

    /// Ranked search, best first, at most `limit` hits / 排序搜索
    async fn execute_ranked(
        &self,
        expression: &MatchExpression,
        limit: usize,
    ) -> Result<Vec<SearchHit>, StoreError>;

    /// Substring search in backend-native order, at most `limit` rows / 子串搜索
    async fn execute_substring(
        &self,
        filter: &SubstringFilter,
        limit: usize,
    ) -> Result<Vec<CatalogItem>, StoreError>;
}

/// Open the store selected by configuration, create its schema / 打开配置的存储
pub async fn connect(
    db: &DatabaseConfig,
    search: &SearchConfig,
) -> anyhow::Result<Arc<dyn CatalogStore>> {
    let url = std::env::var("DATABASE_URL").unwrap_or_else(|_| db.get_database_url());
    let timeout = search.query_timeout();

    match db.backend {
        BackendKind::Sqlite => {
            if let Some(parent) = db.sqlite_path().parent() {
                std::fs::create_dir_all(parent)?;
            }
            let store = SqliteCatalog::connect(&url, db.max_connections, timeout)
                .await?
                .with_weights(search.weights.clone());
            store.init(db.enable_fts).await?;
            if let Some(items) = crate::db::seed_items(db)? {
                let n = store.upsert_items(&items).await?;
                tracing::info!("Seeded {} items into sqlite catalog", n);
            }
            Ok(Arc::new(store))
        }
        BackendKind::Postgres => {
            let store = PgCatalog::connect(&url, db.max_connections, timeout).await?;
            store.init().await?;
            if let Some(items) = crate::db::seed_items(db)? {
                let n = store.upsert_items(&items).await?;
                tracing::info!("Seeded {} items into postgres catalog", n);
            }
            Ok(Arc::new(store))
        }
    }
}

/// Run a query under the store's timeout / 带超时执行查询
pub(crate) async fn with_timeout<T, F>(timeout: Duration, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result.map_err(StoreError::from),
        Err(_) => Err(StoreError::Timeout(timeout)),
    }
}

/// `LIMIT` bind value / LIMIT 参数
pub(crate) fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

/// Columns of `items`, prefixed with the `i` alias / 商品列
pub(crate) const ITEM_COLUMNS: &str = "i.id, i.image, i.company, i.item_name, i.original_price, \
    i.current_price, i.discount_percentage, i.return_period, i.delivery_date, i.rating_stars, \
    i.rating_count, i.category, i.tags";

/// Render a substring filter as a WHERE clause plus its bind values / 生成 WHERE 子句
///
/// `column` names the matched column of a field, `like` is the dialect's
/// matching operator (`LIKE` or `ILIKE`) and `placeholder` yields the next
/// bind marker (`?` or `$n`).
pub(crate) fn render_substring_where(
    filter: &SubstringFilter,
    column: fn(&SearchField) -> &'static str,
    like: &str,
    mut placeholder: impl FnMut() -> String,
) -> (String, Vec<String>) {
    let mut binds = Vec::new();
    let mut groups = Vec::with_capacity(filter.groups.len());

    for group in &filter.groups {
        let mut blocks = Vec::with_capacity(group.blocks.len());
        for block in &group.blocks {
            let preds: Vec<String> = block
                .fields
                .iter()
                .map(|field| {
                    binds.push(block.pattern.clone());
                    format!("i.{} {} {} ESCAPE '\\'", column(field), like, placeholder())
                })
                .collect();
            blocks.push(format!("({})", preds.join(" OR ")));
        }
        if !blocks.is_empty() {
            groups.push(format!("({})", blocks.join(" AND ")));
        }
    }

    let joiner = format!(" {} ", filter.op.as_sql());
    (groups.join(&joiner), binds)
}
