//! Error types for remote calls and provisioning steps.
//!
//! Every remote failure collapses into [`ApiError::RequestFailed`]: the
//! service's "not found", "permission denied", "rate limited" and
//! "malformed request" responses are not distinguished. Callers decide
//! whether to skip the dependent step or abort.

use thiserror::Error;

/// Failure of a single call against the Notion API.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// Non-success status, or the request never completed.
    ///
    /// `status` is `None` when the failure happened below HTTP
    /// (DNS, connect, TLS, body read).
    #[error("{method} {url} failed: {}", describe_failure(.status, .message))]
    RequestFailed {
        method: &'static str,
        url: String,
        status: Option<u16>,
        message: String,
    },

    /// A request model failed validation; nothing was sent.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Success status, but the body did not have the expected shape.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

fn describe_failure(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("{} {}", code, message),
        None => message.to_string(),
    }
}

/// Failure of a provisioning step that depends on earlier steps.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// A supporting collection that must be referenced was never created.
    #[error("supporting collection '{0}' is missing; refusing to create a dangling relation")]
    MissingCollection(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_failed_display_with_status() {
        let err = ApiError::RequestFailed {
            method: "POST",
            url: "https://api.notion.com/v1/databases".to_string(),
            status: Some(400),
            message: "{\"code\":\"validation_error\"}".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "POST https://api.notion.com/v1/databases failed: 400 {\"code\":\"validation_error\"}"
        );
    }

    #[test]
    fn test_request_failed_display_transport() {
        let err = ApiError::RequestFailed {
            method: "GET",
            url: "http://127.0.0.1:1/databases/x".to_string(),
            status: None,
            message: "connection refused".to_string(),
        };
        assert!(err.to_string().ends_with("failed: connection refused"));
    }

    #[test]
    fn test_missing_collection_display() {
        let err = ProvisionError::MissingCollection("Recipes".to_string());
        assert!(err.to_string().contains("'Recipes'"));
    }
}
