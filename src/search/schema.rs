//! Search types shared by the parser, builders, negotiator and engine / 搜索类型定义

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::models::CatalogItem;

/// Parsed user query / 解析后的查询
///
/// Phrases keep their original case, terms are lowercased. Both keep the
/// order of first occurrence so generated expressions are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuredQuery {
    pub phrases: Vec<String>,
    pub terms: Vec<String>,
}

impl StructuredQuery {
    /// No phrase and no term: callers must answer with zero results / 空查询
    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty() && self.terms.is_empty()
    }
}

/// Requested search mode / 搜索模式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Ranked when the backend supports it, substring otherwise
    #[default]
    Auto,
    /// Ranked only, fails when unsupported
    #[serde(alias = "fts")]
    Ranked,
    /// Substring matching only
    #[serde(alias = "like")]
    Fallback,
}

impl SearchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMode::Auto => "auto",
            SearchMode::Ranked => "ranked",
            SearchMode::Fallback => "fallback",
        }
    }
}

impl FromStr for SearchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(SearchMode::Auto),
            "ranked" | "fts" => Ok(SearchMode::Ranked),
            "fallback" | "like" => Ok(SearchMode::Fallback),
            other => Err(format!("unknown search mode: {}", other)),
        }
    }
}

/// How fallback keyword blocks are combined / 关键词组合方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BooleanOp {
    #[default]
    #[serde(rename = "AND", alias = "and")]
    And,
    #[serde(rename = "OR", alias = "or")]
    Or,
}

impl BooleanOp {
    /// SQL keyword / SQL 关键字
    pub fn as_sql(&self) -> &'static str {
        match self {
            BooleanOp::And => "AND",
            BooleanOp::Or => "OR",
        }
    }
}

impl FromStr for BooleanOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AND" => Ok(BooleanOp::And),
            "OR" => Ok(BooleanOp::Or),
            other => Err(format!("unknown boolean operator: {}", other)),
        }
    }
}

/// Which ranked engine a store runs / 存储支持的排序引擎
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankedBackend {
    /// Inverted index with prefix + phrase syntax (SQLite FTS5)
    Index,
    /// Text-search vectors with their own query parser (PostgreSQL tsvector)
    VectorText,
}

/// Execution path picked by the negotiator / 协商后的执行路径
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedPath {
    RankedIndex,
    VectorText,
    SubstringFallback,
}

impl ResolvedPath {
    pub fn is_ranked(&self) -> bool {
        !matches!(self, ResolvedPath::SubstringFallback)
    }
}

/// Backend match expression for ranked paths / 排序路径的匹配表达式
///
/// Opaque to the engine: built by a builder, consumed by a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchExpression {
    RankedIndex(String),
    VectorText(String),
}

impl MatchExpression {
    pub fn as_str(&self) -> &str {
        match self {
            MatchExpression::RankedIndex(s) | MatchExpression::VectorText(s) => s,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.as_str().trim().is_empty()
    }
}

/// Catalog field a substring predicate looks at / 子串匹配字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Name,
    Vendor,
    Category,
    Tags,
}

impl SearchField {
    pub const ALL: [SearchField; 4] = [
        SearchField::Name,
        SearchField::Vendor,
        SearchField::Category,
        SearchField::Tags,
    ];

    /// Column in the `items` table / 对应列名
    pub fn column(&self) -> &'static str {
        match self {
            SearchField::Name => "item_name",
            SearchField::Vendor => "company",
            SearchField::Category => "category",
            SearchField::Tags => "tags",
        }
    }

    /// Lowercased copy of the column, for stores whose LIKE only folds ASCII / 小写副本列名
    pub fn folded_column(&self) -> &'static str {
        match self {
            SearchField::Name => "item_name_lc",
            SearchField::Vendor => "company_lc",
            SearchField::Category => "category_lc",
            SearchField::Tags => "tags_lc",
        }
    }
}

/// One keyword matched against every searchable field (OR) / 单个关键词块
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordBlock {
    /// Original keyword, for logging
    pub keyword: String,
    /// Lowercased, `%`-wrapped pattern with `\`, `%` and `_` escaped
    pub pattern: String,
    pub fields: Vec<SearchField>,
}

/// Keyword blocks that must all match (AND) / 必须全部匹配的关键词组
///
/// Terms yield a group of one block, phrases one block per word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordGroup {
    pub blocks: Vec<KeywordBlock>,
}

/// Predicate tree for substring-only stores / 子串匹配谓词树
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstringFilter {
    pub groups: Vec<KeywordGroup>,
    pub op: BooleanOp,
}

impl SubstringFilter {
    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(|g| g.blocks.is_empty())
    }
}

/// Search result item / 搜索结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(flatten)]
    pub item: CatalogItem,
    /// Relevance, higher is better; only set on ranked paths / 相关性分数
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl SearchHit {
    pub fn ranked(item: CatalogItem, score: f32) -> Self {
        Self { item, score: Some(score) }
    }

    pub fn unranked(item: CatalogItem) -> Self {
        Self { item, score: None }
    }
}
