//! Error types for Notion API operations.
//!
//! Errors are categorized so the retry loop can tell transient failures from
//! permanent ones, and so callers can branch on "object does not exist"
//! without string matching.

use serde::Deserialize;
use std::fmt;

/// Result type alias for Notion API operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of Notion API errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Transport failures, timeouts, 5xx and conflict responses.
    Network,
    /// HTTP 429.
    RateLimited,
    /// The object does not exist or is not shared with the integration.
    NotFound,
    /// Missing, invalid or insufficiently scoped secret.
    Unauthorized,
    /// The request body was rejected.
    Validation,
    /// The response could not be decoded.
    Format,
    /// Other/unknown errors.
    Other,
}

impl ErrorCategory {
    /// Whether this error category is typically transient and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network | Self::RateLimited)
    }

    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Network => "Network connectivity issue",
            Self::RateLimited => "Rate limited by Notion",
            Self::NotFound => "Object not found",
            Self::Unauthorized => "Not authorized",
            Self::Validation => "Request rejected",
            Self::Format => "Unexpected response format",
            Self::Other => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Network => "Check your internet connection and try again",
            Self::RateLimited => "Reduce parallelism or wait before retrying",
            Self::NotFound => {
                "Verify the id and that the page or database is shared with the integration"
            }
            Self::Unauthorized => "Check that the integration secret is valid",
            Self::Validation => "Check the request parameters",
            Self::Format => "The Notion API version may have changed",
            Self::Other => "Check the error details for more information",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors returned by [`crate::NotionApi`] implementations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The object does not exist or the integration cannot see it.
    #[error("not found: {message}")]
    NotFound {
        /// Message from the API.
        message: String,
    },

    /// The secret was rejected.
    #[error("unauthorized: {message}")]
    Unauthorized {
        /// Message from the API.
        message: String,
    },

    /// Too many requests.
    #[error("rate limited: {message}")]
    RateLimited {
        /// Message from the API.
        message: String,
        /// Seconds to wait, from the `Retry-After` header.
        retry_after: Option<u64>,
    },

    /// The request body failed validation.
    #[error("validation failed: {message}")]
    Validation {
        /// Message from the API.
        message: String,
    },

    /// Any other error response from the API.
    #[error("Notion API error (HTTP {status}, {code}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Notion error code, e.g. `conflict_error`.
        code: String,
        /// Message from the API.
        message: String,
    },

    /// The request never produced a response.
    #[error("network error: {message}")]
    Network {
        /// Transport error message.
        message: String,
    },

    /// The response body could not be decoded.
    #[error("invalid API response: {0}")]
    InvalidResponse(String),

    /// Generic error.
    #[error("{0}")]
    Other(String),
}

/// Error body returned by the Notion API.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

impl Error {
    /// Build an error from a non-success HTTP response.
    pub fn from_response(status: u16, body: &str, retry_after: Option<u64>) -> Self {
        let (code, message) = match serde_json::from_str::<ApiErrorBody>(body) {
            Ok(parsed) => (parsed.code, parsed.message),
            Err(_) => (String::new(), body.trim().to_string()),
        };

        match (status, code.as_str()) {
            (404, _) | (_, "object_not_found") => Self::NotFound { message },
            (401 | 403, _) | (_, "unauthorized" | "restricted_resource") => {
                Self::Unauthorized { message }
            }
            (429, _) | (_, "rate_limited") => Self::RateLimited {
                message,
                retry_after,
            },
            (400, "validation_error" | "invalid_json" | "invalid_request") => {
                Self::Validation { message }
            }
            _ => Self::Api {
                status,
                code,
                message,
            },
        }
    }

    /// Get the error category for retry logic.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::NotFound { .. } => ErrorCategory::NotFound,
            Error::Unauthorized { .. } => ErrorCategory::Unauthorized,
            Error::RateLimited { .. } => ErrorCategory::RateLimited,
            Error::Validation { .. } => ErrorCategory::Validation,
            Error::Api { status, .. } => {
                if *status >= 500 || *status == 409 {
                    ErrorCategory::Network
                } else {
                    ErrorCategory::Other
                }
            }
            Error::Network { .. } => ErrorCategory::Network,
            Error::InvalidResponse(_) => ErrorCategory::Format,
            Error::Other(_) => ErrorCategory::Other,
        }
    }

    /// Whether this error is typically transient and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }

    /// Whether the remote object is known not to exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.category() == ErrorCategory::NotFound
    }

    /// Server-requested wait before the next attempt, if any.
    #[must_use]
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            Error::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => Self::from_response(code, "", None),
            other => Self::Network {
                message: other.to_string(),
            },
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}
