//! Post-commit study-suggestion collaborator.
//!
//! Invoked after a record is committed. Advisory only: a failure
//! here is logged and swallowed, never surfaced as a check-in
//! failure, and never rolls anything back.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct SuggestionRequest {
    pub student_id: Uuid,
    pub session_id: String,
    pub subject: String,
}

#[derive(Debug, Error)]
pub enum SuggestError {
    #[error("suggestions are disabled")]
    Disabled,

    #[error("suggestion request failed: {0}")]
    Request(String),
}

pub trait SuggestionClient: Send + Sync {
    fn suggest(
        &self,
        request: &SuggestionRequest,
    ) -> impl Future<Output = Result<String, SuggestError>> + Send;
}

/// Default client for deployments without an AI collaborator.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSuggestions;

impl SuggestionClient for NoSuggestions {
    async fn suggest(&self, _request: &SuggestionRequest) -> Result<String, SuggestError> {
        Err(SuggestError::Disabled)
    }
}
