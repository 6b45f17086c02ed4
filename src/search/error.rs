//! Search errors / 搜索错误

use thiserror::Error;

use crate::storage::StoreError;

#[derive(Debug, Error)]
pub enum SearchError {
    /// Ranked search was forced but the backend cannot rank / 后端不支持排序搜索
    #[error("ranked search is not available on the {backend} backend")]
    CapabilityUnavailable { backend: String },

    /// The store failed to execute the query / 后端执行失败
    #[error("search backend error: {0}")]
    Backend(#[from] StoreError),
}

pub type SearchResult<T> = std::result::Result<T, SearchError>;
