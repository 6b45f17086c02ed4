//! Capability negotiation: requested mode + backend support -> execution path / 能力协商

use super::error::{SearchError, SearchResult};
use super::schema::{RankedBackend, ResolvedPath, SearchMode};

/// Pick the execution path / 选择执行路径
///
/// Only `Auto` may silently fall back to substring matching; a forced
/// `Ranked` request on a backend without ranking is refused.
pub fn choose(
    mode: SearchMode,
    ranked_available: bool,
    backend: RankedBackend,
    backend_name: &str,
) -> SearchResult<ResolvedPath> {
    match mode {
        SearchMode::Fallback => Ok(ResolvedPath::SubstringFallback),
        SearchMode::Ranked if !ranked_available => Err(SearchError::CapabilityUnavailable {
            backend: backend_name.to_string(),
        }),
        SearchMode::Ranked => Ok(ranked_path(backend)),
        SearchMode::Auto if ranked_available => Ok(ranked_path(backend)),
        SearchMode::Auto => Ok(ResolvedPath::SubstringFallback),
    }
}

fn ranked_path(backend: RankedBackend) -> ResolvedPath {
    match backend {
        RankedBackend::Index => ResolvedPath::RankedIndex,
        RankedBackend::VectorText => ResolvedPath::VectorText,
    }
}
