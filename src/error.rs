//! Error types for the switchbridge engine

use thiserror::Error;

/// Result type alias for switchbridge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to the provider or dispatching commands
///
/// The taxonomy is closed on purpose: the retry controller decides
/// eligibility from the variant alone, so every failure the engine can see
/// must map into exactly one of these.
#[derive(Debug, Error)]
pub enum Error {
    /// Provider rejected the token/signature (HTTP 401)
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// Provider refused the operation (HTTP 403)
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Provider could not process the request (HTTP 422)
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// No device with the given identifier in the registry
    #[error("unknown device: {0}")]
    UnknownDevice(String),

    /// Command name not accepted by the target device
    #[error("unsupported command '{command}' for device {device_id}")]
    UnsupportedCommand {
        /// Target device identifier
        device_id: String,
        /// Rejected command name
        command: String,
    },

    /// Provider rate limit hit (HTTP 429)
    #[error("rate limited by provider")]
    RateLimited,

    /// Request exceeded the wall-clock timeout
    #[error("request timed out")]
    Timeout,

    /// Transport-level failure (connect, DNS, reset)
    #[error("network error: {0}")]
    Network(String),

    /// Provider-side failure: 5xx, or a logical status other than success
    #[error("provider error: {0}")]
    Api(String),

    /// Response body did not match the provider envelope
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the retry controller may re-attempt an operation that failed
    /// with this error
    ///
    /// Rate limits, timeouts, transport faults, and provider-side failures
    /// are transient. Auth and validation failures never heal on retry.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::Timeout | Self::Network(_) | Self::Api(_)
        )
    }
}
