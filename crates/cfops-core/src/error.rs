//! Normalized error type surfaced by client requests.
//!
//! Every failure that leaves [`crate::request::ClientRequest::run`] is a
//! [`CloudError`]: either one raised as-is by an operation, or an arbitrary
//! failure wrapped into one. Cancellation is never a `CloudError`.

use std::fmt;

/// Category of a [`CloudError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloudErrorKind {
    /// No connected client could be obtained for the request.
    NoClient,
    /// Connectivity problem recognized by an error classifier.
    Connection,
    /// Remote API answered with a non-success HTTP status.
    Http(u16),
    /// Any other operation failure.
    Operation,
}

/// Structured, recoverable error carrying a message and an optional cause chain.
#[derive(Debug)]
pub struct CloudError {
    kind: CloudErrorKind,
    message: String,
    cause: Option<anyhow::Error>,
}

impl CloudError {
    pub fn new(kind: CloudErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            cause: None,
        }
    }

    /// Attach the underlying failure.
    pub fn with_cause(mut self, cause: impl Into<anyhow::Error>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    /// Setup failure: the client provider returned nothing (or failed).
    pub fn no_client(label: &str, cause: Option<anyhow::Error>) -> Self {
        let err = Self::new(
            CloudErrorKind::NoClient,
            format!("no client available to perform operation: {}", label),
        );
        match cause {
            Some(cause) => err.with_cause(cause),
            None => err,
        }
    }

    /// Connection-class error built from a classifier description; the
    /// original error is kept as the cause.
    pub fn connection(description: impl Into<String>, cause: CloudError) -> Self {
        Self {
            kind: CloudErrorKind::Connection,
            message: description.into(),
            cause: Some(anyhow::Error::new(cause)),
        }
    }

    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::new(CloudErrorKind::Http(status), message)
    }

    pub fn operation(message: impl Into<String>) -> Self {
        Self::new(CloudErrorKind::Operation, message)
    }

    /// Normalize a raised failure: a `CloudError` passes through unchanged,
    /// anything else is wrapped as an operation error with the original as cause.
    pub fn from_failure(error: anyhow::Error) -> Self {
        match error.downcast::<CloudError>() {
            Ok(structured) => structured,
            Err(other) => Self {
                kind: CloudErrorKind::Operation,
                message: other.to_string(),
                cause: Some(other),
            },
        }
    }

    pub fn kind(&self) -> CloudErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn cause(&self) -> Option<&anyhow::Error> {
        self.cause.as_ref()
    }

    pub fn is_connection_error(&self) -> bool {
        self.kind == CloudErrorKind::Connection
    }

    /// True for HTTP 5xx responses.
    pub fn is_server_error(&self) -> bool {
        matches!(self.kind, CloudErrorKind::Http(code) if (500..=599).contains(&code))
    }
}

impl fmt::Display for CloudError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CloudError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|e| &**e as &(dyn std::error::Error + 'static))
    }
}

/// Caller-facing error for code that prefers `?` over matching on
/// [`crate::request::Outcome`].
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// The progress monitor was canceled before the request could finish.
    #[error("operation canceled")]
    Canceled,
    #[error(transparent)]
    Failed(#[from] CloudError),
}
