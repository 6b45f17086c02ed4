//! Search module - turns raw user text into ranked or filtered catalog rows / 搜索模块
//!
//! Pipeline / 流程：
//! - tokenizer: raw text → phrases + terms
//! - negotiator: requested mode + probed capability → execution path
//! - builder: one builder per path, output is opaque to the engine
//! - engine: dispatches to the store and caps the result
//!
//! Call direction: API → Search → Storage (unidirectional) / 调用方向

pub mod builder;
pub mod engine;
pub mod error;
pub mod negotiator;
pub mod schema;
pub mod tokenizer;

pub use engine::SearchEngine;
pub use error::{SearchError, SearchResult};
pub use schema::{BooleanOp, SearchHit, SearchMode, StructuredQuery};
