//! SQLite catalog store - FTS5 ranked search with LIKE fallback / SQLite 商品存储
//!
//! Tables:
//! - items: catalog rows / 商品表
//! - items_fts: FTS5 mirror of the searchable columns, kept in sync by triggers
//!   (optional; without it the store only supports substring search)

use async_trait::async_trait;
use sqlx::{sqlite::SqlitePoolOptions, FromRow, Pool, Row, Sqlite};
use std::time::Duration;

use super::{render_substring_where, sql_limit, with_timeout, CatalogStore, StoreError, ITEM_COLUMNS};
use crate::config::RankWeights;
use crate::models::CatalogItem;
use crate::search::schema::{MatchExpression, RankedBackend, SearchField, SearchHit, SubstringFilter};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite catalog store / SQLite 商品存储
pub struct SqliteCatalog {
    db: Pool<Sqlite>,
    weights: RankWeights,
    timeout: Duration,
}

impl SqliteCatalog {
    /// Open a pool (WAL mode) / 打开连接池
    pub async fn connect(url: &str, max_connections: u32, timeout: Duration) -> Result<Self, StoreError> {
        let db = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect(url)
            .await?;

        // 启用WAL模式，提高并发性能
        sqlx::query("PRAGMA journal_mode=WAL").execute(&db).await?;
        // 设置busy_timeout，避免锁超时
        sqlx::query("PRAGMA busy_timeout=5000").execute(&db).await?;
        sqlx::query("PRAGMA synchronous=NORMAL").execute(&db).await?;

        tracing::info!("SQLite catalog connected: {} (WAL mode)", url);

        Ok(Self::new(db).with_timeout(timeout))
    }

    /// Use an existing pool / 使用现有连接池
    pub fn new(db: Pool<Sqlite>) -> Self {
        Self {
            db,
            weights: RankWeights::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_weights(mut self, weights: RankWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Close the pool / 关闭连接池
    pub async fn close(&self) {
        self.db.close().await;
    }

    /// Create tables and indexes; only creates what is missing / 初始化表结构
    ///
    /// When `with_fts` is set but this SQLite build lacks FTS5, the store keeps
    /// working in substring-only mode.
    pub async fn init(&self, with_fts: bool) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS items (
                id TEXT PRIMARY KEY,
                image TEXT,
                company TEXT,
                item_name TEXT,
                original_price REAL,
                current_price REAL,
                discount_percentage INTEGER,
                return_period INTEGER,
                delivery_date TEXT,
                rating_stars REAL,
                rating_count INTEGER,
                category TEXT,
                tags TEXT,
                item_name_lc TEXT,
                company_lc TEXT,
                category_lc TEXT,
                tags_lc TEXT
            )
            "#,
        )
        .execute(&self.db)
        .await?;

        self.ensure_folded_columns().await?;

        for sql in [
            "CREATE INDEX IF NOT EXISTS idx_items_category ON items(category)",
            "CREATE INDEX IF NOT EXISTS idx_items_tags ON items(tags)",
            "CREATE INDEX IF NOT EXISTS idx_items_item_name ON items(item_name)",
            "CREATE INDEX IF NOT EXISTS idx_items_company ON items(company)",
        ] {
            sqlx::query(sql).execute(&self.db).await?;
        }

        if with_fts {
            match self.init_fts().await {
                Ok(()) => self.backfill_fts_if_empty().await?,
                Err(e) => {
                    tracing::warn!("FTS5 not available, falling back to LIKE search: {}", e);
                }
            }
        }

        Ok(())
    }

    /// Add missing lowercased columns and fill them / 补齐小写副本列
    ///
    /// SQLite's LIKE folds ASCII only, so the substring path matches against
    /// copies lowercased in Rust.
    async fn ensure_folded_columns(&self) -> Result<(), StoreError> {
        let existing: Vec<String> = sqlx::query_scalar("SELECT name FROM pragma_table_info('items')")
            .fetch_all(&self.db)
            .await?;

        let mut added = false;
        for field in SearchField::ALL {
            let column = field.folded_column();
            if !existing.iter().any(|c| c == column) {
                sqlx::query(&format!("ALTER TABLE items ADD COLUMN {} TEXT", column))
                    .execute(&self.db)
                    .await?;
                added = true;
            }
        }

        if added {
            let n = self.refold_all().await?;
            tracing::info!("Added lowercased search columns, refolded {} items", n);
        }
        Ok(())
    }

    /// Recompute every lowercased copy / 重新生成小写副本
    async fn refold_all(&self) -> Result<usize, StoreError> {
        type FoldRow = (String, Option<String>, Option<String>, Option<String>, Option<String>);
        let rows: Vec<FoldRow> = sqlx::query_as("SELECT id, item_name, company, category, tags FROM items")
            .fetch_all(&self.db)
            .await?;

        let mut tx = self.db.begin().await?;
        for (id, name, company, category, tags) in &rows {
            sqlx::query(
                "UPDATE items SET item_name_lc = ?, company_lc = ?, category_lc = ?, tags_lc = ? WHERE id = ?",
            )
            .bind(fold(name))
            .bind(fold(company))
            .bind(fold(category))
            .bind(fold(tags))
            .bind(id)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(rows.len())
    }

    async fn init_fts(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE VIRTUAL TABLE IF NOT EXISTS items_fts USING fts5(
                id, item_name, company, category, tags, tokenize = 'unicode61'
            )
            "#,
        )
        .execute(&self.db)
        .await?;

        sqlx::query(
            r#"
            CREATE TRIGGER IF NOT EXISTS items_ai
            AFTER INSERT ON items BEGIN
                INSERT INTO items_fts (id, item_name, company, category, tags)
                VALUES (new.id, new.item_name, new.company, new.category, new.tags);
            END
            "#,
        )
        .execute(&self.db)
        .await?;

        sqlx::query(
            r#"
            CREATE TRIGGER IF NOT EXISTS items_ad
            AFTER DELETE ON items BEGIN
                DELETE FROM items_fts WHERE id = old.id;
            END
            "#,
        )
        .execute(&self.db)
        .await?;

        sqlx::query(
            r#"
            CREATE TRIGGER IF NOT EXISTS items_au
            AFTER UPDATE ON items BEGIN
                UPDATE items_fts
                SET item_name = new.item_name, company = new.company,
                    category = new.category, tags = new.tags
                WHERE id = old.id;
            END
            "#,
        )
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// Rebuild the FTS mirror from `items` / 从 items 重建全文索引
    pub async fn backfill_fts(&self) -> Result<(), StoreError> {
        let mut tx = self.db.begin().await?;
        sqlx::query("DELETE FROM items_fts").execute(&mut *tx).await?;
        sqlx::query(
            r#"
            INSERT INTO items_fts (id, item_name, company, category, tags)
            SELECT id, item_name, company, category, tags FROM items
            "#,
        )
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn backfill_fts_if_empty(&self) -> Result<(), StoreError> {
        let (fts_rows,): (i64,) = sqlx::query_as("SELECT COUNT(1) FROM items_fts")
            .fetch_one(&self.db)
            .await?;
        if fts_rows == 0 && self.count().await? > 0 {
            self.backfill_fts().await?;
            tracing::info!("FTS backfilled from items");
        }
        Ok(())
    }

    /// Number of catalog rows / 商品数量
    pub async fn count(&self) -> Result<i64, StoreError> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(1) FROM items")
            .fetch_one(&self.db)
            .await?;
        Ok(n)
    }

    /// Insert or update items by id / 批量写入商品
    pub async fn upsert_items(&self, items: &[CatalogItem]) -> Result<usize, StoreError> {
        if items.is_empty() {
            return Ok(0);
        }

        let mut tx = self.db.begin().await?;
        for it in items {
            sqlx::query(
                r#"
                INSERT INTO items (id, image, company, item_name, original_price, current_price,
                                   discount_percentage, return_period, delivery_date,
                                   rating_stars, rating_count, category, tags,
                                   item_name_lc, company_lc, category_lc, tags_lc)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(id) DO UPDATE SET
                    image = excluded.image, company = excluded.company,
                    item_name = excluded.item_name, original_price = excluded.original_price,
                    current_price = excluded.current_price,
                    discount_percentage = excluded.discount_percentage,
                    return_period = excluded.return_period, delivery_date = excluded.delivery_date,
                    rating_stars = excluded.rating_stars, rating_count = excluded.rating_count,
                    category = excluded.category, tags = excluded.tags,
                    item_name_lc = excluded.item_name_lc, company_lc = excluded.company_lc,
                    category_lc = excluded.category_lc, tags_lc = excluded.tags_lc
                "#,
            )
            .bind(&it.id)
            .bind(&it.image)
            .bind(&it.company)
            .bind(&it.item_name)
            .bind(it.original_price)
            .bind(it.current_price)
            .bind(it.discount_percentage)
            .bind(it.return_period)
            .bind(&it.delivery_date)
            .bind(it.rating_stars)
            .bind(it.rating_count)
            .bind(&it.category)
            .bind(&it.tags)
            .bind(fold(&it.item_name))
            .bind(fold(&it.company))
            .bind(fold(&it.category))
            .bind(fold(&it.tags))
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        Ok(items.len())
    }

    fn ranked_sql(&self) -> String {
        let w = &self.weights;
        format!(
            r#"
            SELECT {cols}, bm25(items_fts, {}, {}, {}, {}, {}) AS rank
            FROM items_fts
            JOIN items i ON i.id = items_fts.id
            WHERE items_fts MATCH ?
            ORDER BY rank, i.id
            LIMIT ?
            "#,
            w.id,
            w.item_name,
            w.company,
            w.category,
            w.tags,
            cols = ITEM_COLUMNS,
        )
    }
}

fn fold(value: &Option<String>) -> Option<String> {
    value.as_deref().map(str::to_lowercase)
}

#[async_trait]
impl CatalogStore for SqliteCatalog {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn ranked_backend(&self) -> RankedBackend {
        RankedBackend::Index
    }

    async fn probe_ranked_capability(&self) -> bool {
        let found: Result<Option<(i64,)>, sqlx::Error> = sqlx::query_as(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'items_fts'",
        )
        .fetch_optional(&self.db)
        .await;

        match found {
            Ok(row) => row.is_some(),
            Err(e) => {
                tracing::warn!("FTS probe failed: {}", e);
                false
            }
        }
    }

    async fn execute_ranked(
        &self,
        expression: &MatchExpression,
        limit: usize,
    ) -> Result<Vec<SearchHit>, StoreError> {
        let sql = self.ranked_sql();
        let rows = with_timeout(
            self.timeout,
            sqlx::query(&sql)
                .bind(expression.as_str())
                .bind(sql_limit(limit))
                .fetch_all(&self.db),
        )
        .await?;

        let mut hits = Vec::with_capacity(rows.len());
        for row in &rows {
            let item = CatalogItem::from_row(row)?;
            let rank: f64 = row.try_get("rank")?;
            // bm25() is negative, more negative is better
            hits.push(SearchHit::ranked(item, (-rank) as f32));
        }
        Ok(hits)
    }

    async fn execute_substring(
        &self,
        filter: &SubstringFilter,
        limit: usize,
    ) -> Result<Vec<CatalogItem>, StoreError> {
        if filter.is_empty() {
            return Ok(Vec::new());
        }

        let (clause, binds) = render_substring_where(filter, SearchField::folded_column, "LIKE", || "?".to_string());
        let sql = format!("SELECT {} FROM items i WHERE {} LIMIT ?", ITEM_COLUMNS, clause);

        let mut query = sqlx::query_as::<_, CatalogItem>(&sql);
        for pattern in binds {
            query = query.bind(pattern);
        }
        let items = with_timeout(self.timeout, query.bind(sql_limit(limit)).fetch_all(&self.db)).await?;
        Ok(items)
    }
}
