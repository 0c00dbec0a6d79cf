//! HTTP status code tables used for classification and retry decisions

/// First status code that is not a success.
pub const MULTIPLE_CHOICES: u16 = 300;
/// Missing or invalid credentials.
pub const UNAUTHORIZED: u16 = 401;
/// Credentials lack the required scope.
pub const FORBIDDEN: u16 = 403;
/// Rate limit hit.
pub const TOO_MANY_REQUESTS: u16 = 429;
/// Generic server failure.
pub const INTERNAL_SERVER_ERROR: u16 = 500;
/// Upstream failure behind a proxy.
pub const BAD_GATEWAY: u16 = 502;
/// Server temporarily unavailable.
pub const SERVICE_UNAVAILABLE: u16 = 503;
/// Upstream timeout behind a proxy.
pub const GATEWAY_TIMEOUT: u16 = 504;

/// Statuses worth another attempt.
pub const RETRYABLE_STATUS_CODES: [u16; 5] = [
    TOO_MANY_REQUESTS,
    INTERNAL_SERVER_ERROR,
    BAD_GATEWAY,
    SERVICE_UNAVAILABLE,
    GATEWAY_TIMEOUT,
];

/// Statuses reported as authentication failures.
pub const AUTHENTICATION_ERROR_STATUS_CODES: [u16; 2] = [UNAUTHORIZED, FORBIDDEN];

/// Header carrying the server's requested retry delay, in seconds.
pub const RETRY_AFTER_HEADER: &str = "retry-after";

/// Returns true if a response with this status should be retried.
#[must_use]
pub fn is_retryable(status: u16) -> bool {
    RETRYABLE_STATUS_CODES.contains(&status)
}

/// The error variant a failed status maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// 401 or 403
    Authentication,
    /// 429
    RateLimit,
    /// Any other failure status
    Api,
}

/// Classifies a failure status code.
#[must_use]
pub fn classify(status: u16) -> ErrorClass {
    if AUTHENTICATION_ERROR_STATUS_CODES.contains(&status) {
        ErrorClass::Authentication
    } else if status == TOO_MANY_REQUESTS {
        ErrorClass::RateLimit
    } else {
        ErrorClass::Api
    }
}
