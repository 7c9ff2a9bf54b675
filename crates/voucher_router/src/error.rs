//! Error types for the voucher router.
//!
//! Only the generative fallback tier produces errors. The pattern tier never
//! fails: no match is `Intent::Unclassified` and an empty parameter map.

use thiserror::Error;

use crate::llm_client::LlmError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RouterError {
    /// Malformed caller input (empty message, oversize message or context).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The external classifier could not be reached or failed while processing.
    #[error("LLM processing failed after {attempts} attempt(s): {last_error}")]
    LlmProcessing { attempts: u32, last_error: String },

    /// The external classifier replied, but the reply broke the response contract.
    #[error("Invalid LLM response: {0}")]
    InvalidLlmResponse(String),
}

impl RouterError {
    pub fn code(&self) -> &'static str {
        match self {
            RouterError::InvalidInput(_) => "invalid_input",
            RouterError::LlmProcessing { .. } => "llm_processing",
            RouterError::InvalidLlmResponse(_) => "invalid_llm_response",
        }
    }

    /// Only transport/processing failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RouterError::LlmProcessing { .. })
    }

    pub(crate) fn exhausted(attempts: u32, last_error: Option<&LlmError>) -> Self {
        RouterError::LlmProcessing {
            attempts,
            last_error: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no attempt was made".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_processing_errors_are_retryable() {
        assert!(!RouterError::InvalidInput("empty".into()).is_retryable());
        assert!(!RouterError::InvalidLlmResponse("bad intent".into()).is_retryable());
        assert!(RouterError::exhausted(3, Some(&LlmError::Timeout(30))).is_retryable());
    }

    #[test]
    fn test_exhausted_message_names_last_error() {
        let err = RouterError::exhausted(3, Some(&LlmError::Http("HTTP 502".into())));
        let text = err.to_string();
        assert!(text.contains("3 attempt"));
        assert!(text.contains("HTTP 502"));
        assert_eq!(err.code(), "llm_processing");
    }
}
