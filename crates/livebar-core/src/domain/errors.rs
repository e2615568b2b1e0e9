//! Errors - エラー型と分類
//!
//! Every failure that crosses a port boundary is a [`LivebarError`]. The retry
//! wrapper and the destination task only look at [`LivebarError::kind`] to
//! decide what happens next.

use thiserror::Error;

/// ErrorKind は実行エラーの分類
///
/// - Transient: retried by the operation wrapper after a fixed delay
/// - Rejected: the remote side refused the request, skip the rest of the cycle
/// - Unauthorized: credentials are bad, the destination task stops
/// - Permanent: anything else that retrying cannot fix
/// - Shutdown: a shutdown was requested while waiting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transient,
    Rejected,
    Unauthorized,
    Permanent,
    Shutdown,
}

#[derive(Debug, Error)]
pub enum LivebarError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("rate limit still exceeded after {attempts} attempts")]
    RateLimited { attempts: u32 },

    #[error("service unavailable after {attempts} attempts")]
    Unavailable { attempts: u32 },

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("authorization failed: {0}")]
    Unauthorized(String),

    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("failed to persist settings: {0}")]
    Persist(String),

    #[error("shutdown requested")]
    Shutdown,
}

impl LivebarError {
    /// Builds the error for a non-2xx response that the caller does not handle itself.
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        match status {
            401 => Self::Unauthorized(body.into()),
            _ => Self::Http {
                status,
                body: body.into(),
            },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            LivebarError::Network(_)
            | LivebarError::Timeout(_)
            | LivebarError::RateLimited { .. }
            | LivebarError::Unavailable { .. }
            | LivebarError::Decode(_) => ErrorKind::Transient,
            LivebarError::Http { status, .. } if *status >= 500 || *status == 429 => {
                ErrorKind::Transient
            }
            LivebarError::Http { .. } | LivebarError::Rejected(_) => ErrorKind::Rejected,
            LivebarError::Unauthorized(_) => ErrorKind::Unauthorized,
            LivebarError::Persist(_) => ErrorKind::Permanent,
            LivebarError::Shutdown => ErrorKind::Shutdown,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }
}

pub type Result<T> = std::result::Result<T, LivebarError>;
