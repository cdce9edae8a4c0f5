//! Recognize connection-level failures and describe them for users.

use std::error::Error;
use std::io;

use crate::error::{CloudError, CloudErrorKind};

/// Decides whether a terminal request error is a connectivity problem.
pub trait ErrorClassifier {
    /// A human-readable description when `error` is a connection failure,
    /// `None` otherwise.
    fn connection_error(&self, error: &CloudError) -> Option<String>;
}

impl<F> ErrorClassifier for F
where
    F: Fn(&CloudError) -> Option<String>,
{
    fn connection_error(&self, error: &CloudError) -> Option<String> {
        self(error)
    }
}

/// Default classifier: inspects the cause chain for socket-level IO errors,
/// then falls back to well-known message fragments.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectionErrorClassifier;

impl ErrorClassifier for ConnectionErrorClassifier {
    fn connection_error(&self, error: &CloudError) -> Option<String> {
        // Already described.
        if error.is_connection_error() {
            return None;
        }
        // The platform answered.
        if let CloudErrorKind::Http(_) = error.kind() {
            return None;
        }
        connection_reason(error).map(|reason| {
            format!("Unable to communicate with the remote platform: {}", reason)
        })
    }
}

/// Message fragments (lowercase) that identify a connection failure.
const CONNECTION_PATTERNS: &[(&str, &str)] = &[
    ("unknown host", "unknown host"),
    ("could not resolve", "unknown host"),
    ("name resolution", "unknown host"),
    ("connection refused", "connection refused"),
    ("connection reset", "connection lost"),
    ("broken pipe", "connection lost"),
    ("network is unreachable", "network unreachable"),
    ("network unreachable", "network unreachable"),
    ("no route to host", "no route to host"),
    ("timed out", "connection timed out"),
];

/// Short reason if anything in `error`'s source chain looks like a
/// connection failure.
pub fn connection_reason(error: &(dyn Error + 'static)) -> Option<&'static str> {
    let chain = || std::iter::successors(Some(error), |&e| e.source());

    let from_io = chain()
        .filter_map(|e| e.downcast_ref::<io::Error>())
        .find_map(|e| io_reason(e.kind()));
    if from_io.is_some() {
        return from_io;
    }

    chain().find_map(|e| {
        let text = e.to_string().to_lowercase();
        CONNECTION_PATTERNS
            .iter()
            .find(|(pattern, _)| text.contains(pattern))
            .map(|(_, reason)| *reason)
    })
}

fn io_reason(kind: io::ErrorKind) -> Option<&'static str> {
    match kind {
        io::ErrorKind::ConnectionRefused => Some("connection refused"),
        io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::BrokenPipe => Some("connection lost"),
        io::ErrorKind::NotConnected => Some("not connected"),
        io::ErrorKind::TimedOut => Some("connection timed out"),
        io::ErrorKind::AddrNotAvailable => Some("address not available"),
        _ => None,
    }
}
