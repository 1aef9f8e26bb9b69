// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Errors returned by quadlink operations.

/// Errors returned by quadlink operations.
///
/// This enum covers all error conditions that can occur on the ground link,
/// from address resolution to event handler failures.
///
/// # Example
///
/// ```rust,no_run
/// use quadlink::{Error, Link};
///
/// match Link::open("10.0.0.5") {
///     Err(Error::Connection(msg)) => println!("Could not open link: {}", msg),
///     Err(e) => println!("Other error: {}", e),
///     Ok(_) => println!("Connected"),
/// }
/// ```
#[derive(Debug)]
pub enum Error {
    // ========================================================================
    // Link Errors
    // ========================================================================
    /// Bad address or socket-create failure. Fatal to `Link::open`.
    Connection(String),
    /// UDP send/receive I/O failure. Non-fatal: the heartbeat resends
    /// fresh state on the next cycle.
    Transport(std::io::Error),
    /// Unknown packet id or truncated payload. Ignored at the receive loop,
    /// surfaced only by the codec/packet layer itself.
    Protocol(String),

    // ========================================================================
    // Input Errors
    // ========================================================================
    /// Invalid input at construction time (e.g. negative throttle).
    Validation(String),

    // ========================================================================
    // Event Errors
    // ========================================================================
    /// One or more synchronous event handlers failed. Raised only after all
    /// handlers for the event have run; carries every handler failure.
    Dispatch(Vec<String>),

    // ========================================================================
    // Registry Errors
    // ========================================================================
    /// Registry value could not be rendered to or parsed from a string.
    Render(String),
    /// Remote registry update was rejected (non-200) or could not be pushed.
    RemoteUpdate(String),
    /// HTTP client failure talking to the firmware's registry service.
    Http(reqwest::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Connection(msg) => write!(f, "Connection failed: {}", msg),
            Error::Transport(e) => write!(f, "Transport error: {}", e),
            Error::Protocol(msg) => write!(f, "Protocol error: {}", msg),
            Error::Validation(msg) => write!(f, "Validation failed: {}", msg),
            Error::Dispatch(errors) => write!(
                f,
                "{} event handler(s) failed: {}",
                errors.len(),
                errors.join("; ")
            ),
            Error::Render(msg) => write!(f, "Render failed: {}", msg),
            Error::RemoteUpdate(msg) => write!(f, "Remote update failed: {}", msg),
            Error::Http(e) => write!(f, "HTTP error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Transport(e) => Some(e),
            Error::Http(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Transport(e)
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Http(e)
    }
}

/// Convenient alias for API results using the public `Error` type.
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_dispatch_aggregates_all() {
        let err = Error::Dispatch(vec!["handler 0: boom".into(), "handler 2: bang".into()]);
        let msg = err.to_string();
        assert!(msg.contains("2 event handler(s) failed"));
        assert!(msg.contains("boom"));
        assert!(msg.contains("bang"));
    }

    #[test]
    fn test_transport_source_is_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = Error::from(io);
        assert!(std::error::Error::source(&err).is_some());
        assert!(matches!(err, Error::Transport(_)));
    }

    #[test]
    fn test_validation_has_no_source() {
        let err = Error::Validation("negative throttle".into());
        assert!(std::error::Error::source(&err).is_none());
    }
}
