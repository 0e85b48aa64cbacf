use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// A non-success status where the caller needed a success
    #[error("Unexpected status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Invalid header value for {0}")]
    InvalidHeader(&'static str),

    #[error("Failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Error for a failed status, with the body truncated for logging.
    /// The request wrapper itself reports statuses as data.
    pub fn status(status: reqwest::StatusCode, body: &str) -> Self {
        ApiError::Status {
            status,
            body: Self::truncate_body(body),
        }
    }

    /// The failed status, if this error carries one
    pub fn status_code(&self) -> Option<reqwest::StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::*;

    #[test]
    fn test_status_error() {
        let err = ApiError::status(StatusCode::FORBIDDEN, "CSRF Failed");
        assert_eq!(err.status_code(), Some(StatusCode::FORBIDDEN));
        assert_eq!(err.to_string(), "Unexpected status 403 Forbidden: CSRF Failed");

        let long = ApiError::status(StatusCode::BAD_GATEWAY, &"x".repeat(MAX_ERROR_BODY_LENGTH * 2));
        assert!(matches!(long, ApiError::Status { body, .. } if body.contains("truncated")));

        assert_eq!(ApiError::InvalidHeader("X-CSRFToken").status_code(), None);
    }

    #[test]
    fn test_truncate_body() {
        let long = "x".repeat(MAX_ERROR_BODY_LENGTH + 10);
        let truncated = ApiError::truncate_body(&long);
        assert!(truncated.starts_with(&"x".repeat(MAX_ERROR_BODY_LENGTH)));
        assert!(truncated.contains("truncated, 510 total bytes"));

        // Multi-byte characters straddling the limit are not split
        let wide = "é".repeat(MAX_ERROR_BODY_LENGTH);
        assert!(ApiError::truncate_body(&wide).contains("truncated"));
    }
}
