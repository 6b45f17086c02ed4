//! PostgreSQL catalog store - tsvector ranked search with ILIKE fallback / PostgreSQL 商品存储
//!
//! `items.tsv` is a stored generated column. Name, company, category and tags
//! get tsvector weights A..D so `ts_rank` favours name matches; the id is not
//! indexed for text search at all.

use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool, Row};
use std::time::Duration;

use super::{render_substring_where, sql_limit, with_timeout, CatalogStore, StoreError, ITEM_COLUMNS};
use crate::models::CatalogItem;
use crate::search::schema::{MatchExpression, RankedBackend, SearchField, SearchHit, SubstringFilter};

const RANKED_SQL: &str = "SELECT {cols}, ts_rank(i.tsv, q)::float8 AS rank \
    FROM items i, websearch_to_tsquery('simple', $1) q \
    WHERE i.tsv @@ q \
    ORDER BY rank DESC, i.id \
    LIMIT $2";

/// PostgreSQL catalog store / PostgreSQL 商品存储
pub struct PgCatalog {
    pool: PgPool,
    timeout: Duration,
}

impl PgCatalog {
    pub async fn connect(url: &str, max_connections: u32, timeout: Duration) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect(url)
            .await?;
        tracing::info!("PostgreSQL catalog connected");
        Ok(Self::new(pool, timeout))
    }

    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    /// Create table, weighted tsvector column and indexes (idempotent) / 初始化表结构
    pub async fn init(&self) -> Result<(), StoreError> {
        for sql in [
            r#"
            CREATE TABLE IF NOT EXISTS items (
                id TEXT PRIMARY KEY,
                image TEXT,
                company VARCHAR(255),
                item_name TEXT,
                original_price DOUBLE PRECISION,
                current_price DOUBLE PRECISION,
                discount_percentage BIGINT,
                return_period BIGINT,
                delivery_date VARCHAR(64),
                rating_stars DOUBLE PRECISION,
                rating_count BIGINT,
                category VARCHAR(128),
                tags TEXT
            )
            "#,
            r#"
            ALTER TABLE items
            ADD COLUMN IF NOT EXISTS tsv tsvector
            GENERATED ALWAYS AS (
                setweight(to_tsvector('simple', coalesce(item_name, '')), 'A') ||
                setweight(to_tsvector('simple', coalesce(company, '')), 'B') ||
                setweight(to_tsvector('simple', coalesce(category, '')), 'C') ||
                setweight(to_tsvector('simple', coalesce(tags, '')), 'D')
            ) STORED
            "#,
            "CREATE INDEX IF NOT EXISTS idx_items_tsv ON items USING GIN (tsv)",
            "CREATE INDEX IF NOT EXISTS idx_items_category ON items(category)",
            "CREATE INDEX IF NOT EXISTS idx_items_company ON items(company)",
            "CREATE INDEX IF NOT EXISTS idx_items_itemname ON items(item_name)",
        ] {
            sqlx::query(sql).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Insert or update items by id / 批量写入商品
    pub async fn upsert_items(&self, items: &[CatalogItem]) -> Result<usize, StoreError> {
        if items.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        for it in items {
            sqlx::query(
                r#"
                INSERT INTO items (id, image, company, item_name, original_price, current_price,
                                   discount_percentage, return_period, delivery_date,
                                   rating_stars, rating_count, category, tags)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
                ON CONFLICT (id) DO UPDATE SET
                    image = EXCLUDED.image, company = EXCLUDED.company,
                    item_name = EXCLUDED.item_name, original_price = EXCLUDED.original_price,
                    current_price = EXCLUDED.current_price,
                    discount_percentage = EXCLUDED.discount_percentage,
                    return_period = EXCLUDED.return_period, delivery_date = EXCLUDED.delivery_date,
                    rating_stars = EXCLUDED.rating_stars, rating_count = EXCLUDED.rating_count,
                    category = EXCLUDED.category, tags = EXCLUDED.tags
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
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        Ok(items.len())
    }
}

fn ranked_sql() -> String {
    RANKED_SQL.replace("{cols}", ITEM_COLUMNS)
}

/// `SELECT ... WHERE <ILIKE tree> LIMIT $n` plus its pattern binds
fn substring_sql(filter: &SubstringFilter) -> (String, Vec<String>) {
    let mut n = 0;
    let (clause, binds) = render_substring_where(filter, SearchField::column, "ILIKE", || {
        n += 1;
        format!("${}", n)
    });
    let sql = format!(
        "SELECT {} FROM items i WHERE {} LIMIT ${}",
        ITEM_COLUMNS,
        clause,
        binds.len() + 1
    );
    (sql, binds)
}

#[async_trait]
impl CatalogStore for PgCatalog {
    fn name(&self) -> &str {
        "postgres"
    }

    fn ranked_backend(&self) -> RankedBackend {
        RankedBackend::VectorText
    }

    async fn probe_ranked_capability(&self) -> bool {
        let found: Result<bool, sqlx::Error> = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM information_schema.columns
                WHERE table_name = 'items' AND column_name = 'tsv'
            )
            "#,
        )
        .fetch_one(&self.pool)
        .await;

        found.unwrap_or_else(|e| {
            tracing::warn!("tsvector probe failed: {}", e);
            false
        })
    }

    async fn execute_ranked(
        &self,
        expression: &MatchExpression,
        limit: usize,
    ) -> Result<Vec<SearchHit>, StoreError> {
        let sql = ranked_sql();
        let rows = with_timeout(
            self.timeout,
            sqlx::query(&sql)
                .bind(expression.as_str())
                .bind(sql_limit(limit))
                .fetch_all(&self.pool),
        )
        .await?;

        let mut hits = Vec::with_capacity(rows.len());
        for row in &rows {
            let item = CatalogItem::from_row(row)?;
            let rank: f64 = row.try_get("rank")?;
            hits.push(SearchHit::ranked(item, rank as f32));
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

        let (sql, binds) = substring_sql(filter);
        let mut query = sqlx::query_as::<_, CatalogItem>(&sql);
        for pattern in binds {
            query = query.bind(pattern);
        }
        let items = with_timeout(self.timeout, query.bind(sql_limit(limit)).fetch_all(&self.pool)).await?;
        Ok(items)
    }
}
