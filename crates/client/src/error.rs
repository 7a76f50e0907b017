//! Error type for the remote-service client.

use serde::Deserialize;
use verae_core::error::CoreError;

/// Errors from the Verae service client.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A domain-level error from `verae-core` (e.g. an incomplete panel).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The HTTP request itself failed (network, DNS, TLS, decode).
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// A request body could not be encoded as JSON.
    #[error("Failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),

    /// The service returned a non-2xx status code.
    #[error("Service error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// User-facing message extracted from the response `detail` field.
        message: String,
    },

    /// The service rejected the bearer token; the stored token has been
    /// cleared and the user must authenticate again.
    #[error("Unauthorized: the session has expired or the token was rejected")]
    Unauthorized,
}

/// Convenience alias for client call results.
pub type ApiResult<T> = Result<T, ApiError>;

/// Error payload shape used by the service: `{"detail": ...}` where
/// `detail` is either a bare string or `{error_code, message}`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorDetail {
    Text(String),
    Structured {
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        #[allow(dead_code)]
        error_code: Option<String>,
    },
}

/// Extract a user-facing message from an error response body.
///
/// Falls back to the caller-supplied message when the body is not the
/// expected shape or carries no text.
pub(crate) fn extract_detail(body: &str, fallback: &str) -> String {
    let parsed: Option<ErrorBody> = serde_json::from_str(body).ok();
    match parsed.and_then(|body| body.detail) {
        Some(ErrorDetail::Text(text)) if !text.is_empty() => text,
        Some(ErrorDetail::Structured {
            message: Some(message),
            ..
        }) if !message.is_empty() => message,
        _ => fallback.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_as_bare_string() {
        let body = r#"{"detail": "Invalid credentials"}"#;
        assert_eq!(extract_detail(body, "Login failed"), "Invalid credentials");
    }

    #[test]
    fn detail_as_structured_object() {
        let body = r#"{"detail": {"error_code": "analysis_not_found", "message": "Analysis not found for current user"}}"#;
        assert_eq!(
            extract_detail(body, "fallback"),
            "Analysis not found for current user"
        );
    }

    #[test]
    fn malformed_body_falls_back() {
        assert_eq!(extract_detail("<html>boom</html>", "Create analysis failed"), "Create analysis failed");
        assert_eq!(extract_detail("", "fallback"), "fallback");
        assert_eq!(extract_detail(r#"{"detail": {}}"#, "fallback"), "fallback");
    }
}
