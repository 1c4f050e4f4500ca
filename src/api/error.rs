/// Errors surfaced by portal REST clients.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Cannot reach portal service at {0}")]
    Connection(String),
    #[error("Request timed out after {0}s")]
    Timeout(u64),
    #[error("HTTP client error: {0}")]
    HttpClient(String),
    #[error("Portal service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Authentication required")]
    Unauthorized,
    #[error("Request rejected: {0}")]
    Rejected(String),
    #[error("Response carried no data")]
    MissingData,
    #[error("Failed to parse response: {0}")]
    ResponseParsing(String),
    #[error("Not found: {0}")]
    NotFound(String),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Connection(_) => "CONNECTION",
            ApiError::Timeout(_) => "TIMEOUT",
            ApiError::HttpClient(_) => "HTTP_CLIENT",
            ApiError::Status { .. } => "HTTP_STATUS",
            ApiError::Unauthorized => "AUTH_REQUIRED",
            ApiError::Rejected(_) => "REJECTED",
            ApiError::MissingData => "MISSING_DATA",
            ApiError::ResponseParsing(_) => "PARSE",
            ApiError::NotFound(_) => "NOT_FOUND",
        }
    }

    /// Transport failures worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, ApiError::Connection(_) | ApiError::Timeout(_))
            || matches!(self, ApiError::Status { status, .. } if *status >= 500)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes() {
        assert_eq!(ApiError::Unauthorized.code(), "AUTH_REQUIRED");
        assert_eq!(ApiError::MissingData.code(), "MISSING_DATA");
        assert_eq!(ApiError::NotFound("x".into()).code(), "NOT_FOUND");
    }

    #[test]
    fn transient_classification() {
        assert!(ApiError::Timeout(30).is_transient());
        assert!(ApiError::Status { status: 503, body: String::new() }.is_transient());
        assert!(!ApiError::Status { status: 404, body: String::new() }.is_transient());
        assert!(!ApiError::Rejected("bad otp".into()).is_transient());
    }

    #[test]
    fn display_messages() {
        let err = ApiError::Status {
            status: 401,
            body: "expired".into(),
        };
        assert_eq!(err.to_string(), "Portal service returned 401: expired");
    }
}
