//! Error body returned by every endpoint.

use serde::{Deserialize, Serialize};

/// Micropub error body: a short code plus a human description.
///
/// See: https://www.w3.org/TR/micropub/#error-response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable code, e.g. `invalid_request`.
    pub error: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            error_description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.error_description = Some(description.into());
        self
    }

    pub fn invalid_request(description: impl Into<String>) -> Self {
        Self::new("invalid_request").with_description(description)
    }

    pub fn server_error() -> Self {
        Self::new("server_error")
    }
}
