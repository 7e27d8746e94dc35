use async_trait::async_trait;
use crate::errors::RefineError;
use crate::models::SearchCandidate;

/// Discovery collaborator consulted when the reasoning service asks for
/// another search mid-ranking. The engine ships no implementation.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchCandidate>, RefineError>;
}
