//! Per-probe error type and libcurl error classification.

/// A single failed probe. Non-fatal: it is recorded in the candidate's error
/// history and contributes nothing to its samples.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeError {
    /// Connect or read timeout.
    #[error("timed out: {0}")]
    Timeout(String),
    /// DNS, connect or TLS failure before any response.
    #[error("connection failed: {0}")]
    Connect(String),
    /// Any other transfer failure (reset mid-body, protocol error).
    #[error("transport error: {0}")]
    Transport(String),
    /// The server answered with an error status.
    #[error("HTTP {0}")]
    Status(u32),
    /// The blocking probe task panicked or was cancelled.
    #[error("probe task failed: {0}")]
    Task(String),
}

impl From<curl::Error> for ProbeError {
    fn from(e: curl::Error) -> Self {
        if e.is_operation_timedout() {
            return ProbeError::Timeout(e.to_string());
        }
        if e.is_couldnt_connect()
            || e.is_couldnt_resolve_host()
            || e.is_couldnt_resolve_proxy()
            || e.is_ssl_connect_error()
            || e.is_peer_failed_verification()
        {
            return ProbeError::Connect(e.to_string());
        }
        ProbeError::Transport(e.to_string())
    }
}
