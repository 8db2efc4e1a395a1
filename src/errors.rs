//! Error-code protocol shared across services and routes.
//!
//! Every service error maps to a stable machine-readable code so denial
//! responses always carry both a code and a human-readable message. Codes are
//! part of the API contract; messages are not.

/// Machine-readable error classification for API responses.
pub trait ErrorCode: std::fmt::Display {
    /// Stable code, e.g. `E_RATE_LIMITED`.
    fn error_code(&self) -> &'static str;

    /// Whether the caller may retry the same request unchanged.
    fn retryable(&self) -> bool {
        false
    }
}
