/// External provider abstractions
///
/// This module isolates the three upstream services the orchestrator
/// depends on: the generative-AI endpoint (behind credential rotation),
/// the Overpass venue search, and the Unsplash photo search. The traits
/// exist so everything above them can be exercised against mocks.
use crate::error::AppResult;

pub mod gemini;
pub mod overpass;
pub mod unsplash;

/// JSON-producing text generation.
///
/// Implemented by the key-rotation gateway. Returns the candidate text of
/// a successful generation, or `Ok(None)` when the provider answered with
/// a success status but no usable candidate path; that is a content
/// problem for the caller to degrade on, not a credential failure.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate_json(&self, prompt: &str) -> AppResult<Option<String>>;
}

/// Free-text photo lookup, first result only
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ImageSearcher: Send + Sync {
    async fn search_first(&self, query: &str) -> AppResult<Option<String>>;
}
