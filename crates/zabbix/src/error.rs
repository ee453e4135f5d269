//! Error types for Zabbix API operations.
//!
//! Errors are categorized to enable smart retry logic and appropriate
//! user feedback. Only transport-level failures are retried; anything the
//! API itself answered is surfaced as-is.

use thiserror::Error;

/// Categories of API errors for retry logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Connection, DNS, timeout or 5xx gateway errors (transient, retryable)
    Network,
    /// Missing, expired or rejected credentials
    Auth,
    /// The API understood the request and refused it
    Api,
    /// The response was not valid JSON-RPC
    Protocol,
}

impl ErrorCategory {
    /// Whether this error category is typically transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network)
    }

    /// Get a user-friendly description of this error category.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Network => "Network connectivity issue",
            Self::Auth => "Authentication failed",
            Self::Api => "Request rejected by the API",
            Self::Protocol => "Unexpected API response",
        }
    }

    /// Get actionable advice for resolving this error category.
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Network => "Check the API URL and your network connection, then try again",
            Self::Auth => "Check the API token or username/password in the [api] config section",
            Self::Api => "Check the item configuration against the error details",
            Self::Protocol => "Check that the URL points at api_jsonrpc.php",
        }
    }
}

/// Errors that can occur while talking to the Zabbix API.
#[derive(Debug, Error)]
pub enum Error {
    /// Network-related error (connection, timeout, DNS, etc.)
    #[error("network error: {message}")]
    Network {
        /// Detailed error message from the failed network operation
        message: String,
    },

    /// Non-success HTTP status
    #[error("HTTP {status}")]
    Http {
        /// Status code returned by the server
        status: u16,
    },

    /// JSON-RPC error object returned by the API
    #[error("API error {code}: {message} {data}")]
    Api {
        /// JSON-RPC error code
        code: i64,
        /// Short message, e.g. "Invalid params."
        message: String,
        /// Detailed explanation
        data: String,
    },

    /// No usable credentials
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Response did not follow the JSON-RPC envelope
    #[error("invalid API response: {0}")]
    Protocol(String),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Get the error category for retry logic.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Network { .. } => ErrorCategory::Network,
            Error::Http { status } if *status >= 500 => ErrorCategory::Network,
            Error::Http { status: 401 | 403 } | Error::Auth(_) => ErrorCategory::Auth,
            Error::Api { data, message, .. } if is_session_error(message, data) => {
                ErrorCategory::Auth
            }
            Error::Api { .. } | Error::Http { .. } => ErrorCategory::Api,
            Error::Protocol(_) | Error::Json(_) => ErrorCategory::Protocol,
        }
    }

    /// Whether this error is typically transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }
}

fn is_session_error(message: &str, data: &str) -> bool {
    let text = format!("{message} {data}").to_lowercase();
    text.contains("not authorized")
        || text.contains("not authorised")
        || text.contains("session terminated")
        || text.contains("re-login")
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(status) => Self::Http { status },
            ureq::Error::Io(_)
            | ureq::Error::Timeout(_)
            | ureq::Error::HostNotFound
            | ureq::Error::ConnectionFailed => Self::Network {
                message: err.to_string(),
            },
            ureq::Error::Json(e) => Self::Json(e),
            other => Self::Protocol(other.to_string()),
        }
    }
}

/// Result type for Zabbix API operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category_retryable() {
        assert!(ErrorCategory::Network.is_retryable());
        assert!(!ErrorCategory::Api.is_retryable());
        assert!(!ErrorCategory::Auth.is_retryable());
    }

    #[test]
    fn test_http_status_categories() {
        assert_eq!(Error::Http { status: 503 }.category(), ErrorCategory::Network);
        assert_eq!(Error::Http { status: 401 }.category(), ErrorCategory::Auth);
        assert_eq!(Error::Http { status: 404 }.category(), ErrorCategory::Api);
    }

    #[test]
    fn test_api_error_categories() {
        let err = Error::Api {
            code: -32602,
            message: "Invalid params.".into(),
            data: "Invalid parameter \"/1/value_type\": value must be one of 0, 1, 2, 3, 4."
                .into(),
        };
        assert_eq!(err.category(), ErrorCategory::Api);
        assert!(!err.is_retryable());

        let err = Error::Api {
            code: -32602,
            message: "Invalid params.".into(),
            data: "Session terminated, re-login, please.".into(),
        };
        assert_eq!(err.category(), ErrorCategory::Auth);
    }

    #[test]
    fn test_network_error_is_retryable() {
        let err = Error::Network {
            message: "connection refused".into(),
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn test_display() {
        let err = Error::Api {
            code: -32500,
            message: "Application error.".into(),
            data: "Item with key \"web.test\" already exists.".into(),
        };
        assert_eq!(
            err.to_string(),
            "API error -32500: Application error. Item with key \"web.test\" already exists."
        );
    }
}
