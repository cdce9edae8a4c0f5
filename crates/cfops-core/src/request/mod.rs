//! Client requests: run one remote operation with retries and error translation.
//!
//! A [`ClientRequest`] obtains a connected client from a [`ClientProvider`],
//! runs a [`ClientOperation`] against it, and reattempts failed attempts as
//! long as its [`RetryPolicy`] asks for it and the total wait budget allows.
//! Terminal errors are normalized into [`CloudError`]; an [`ErrorClassifier`]
//! turns connectivity problems into connection-class errors.
//!
//! ```ignore
//! let request = ClientRequest::new(
//!     "deploy app",
//!     |_: &SubMonitor| Ok(Some(session.clone())),
//!     |client: &Session, _: &SubMonitor| client.push("my-app"),
//! )?
//! .with_policy(FixedInterval::new(Duration::from_secs(2), Duration::from_secs(60)));
//!
//! match request.run(Some(&monitor)) {
//!     Outcome::Success(app) => println!("deployed {}", app.name),
//!     Outcome::Failure(err) => eprintln!("{}", err),
//!     Outcome::Canceled => {}
//! }
//! ```

mod classify;
mod policy;
mod run;


pub use classify::{connection_reason, ConnectionErrorClassifier, ErrorClassifier};
pub use policy::{FixedInterval, NoRetry, RetryBudget, RetryOn, RetryPolicy, DEFAULT_TOTAL_TIME_WAIT};

use std::marker::PhantomData;

use crate::error::{CloudError, RequestError};
use crate::progress::{ProgressMonitor, SubMonitor, REQUEST_TOTAL_WORK};

/// Resolves a connected client. `Ok(None)` and `Err` both mean "no client".
pub trait ClientProvider<C> {
    fn get_client(&self, progress: &SubMonitor) -> anyhow::Result<Option<C>>;
}

impl<C, F> ClientProvider<C> for F
where
    F: Fn(&SubMonitor) -> anyhow::Result<Option<C>>,
{
    fn get_client(&self, progress: &SubMonitor) -> anyhow::Result<Option<C>> {
        self(progress)
    }
}

/// One attempt of the real remote operation.
///
/// Return an error to have the attempt considered for retry; this includes
/// responses that arrived fine but are not acceptable to the caller.
pub trait ClientOperation<C, T> {
    fn attempt(&self, client: &C, progress: &SubMonitor) -> anyhow::Result<T>;
}

impl<C, T, F> ClientOperation<C, T> for F
where
    F: Fn(&C, &SubMonitor) -> anyhow::Result<T>,
{
    fn attempt(&self, client: &C, progress: &SubMonitor) -> anyhow::Result<T> {
        self(client, progress)
    }
}

/// Result of [`ClientRequest::run`]: exactly one of value, error or cancellation.
#[derive(Debug)]
#[must_use]
pub enum Outcome<T> {
    Success(T),
    Failure(CloudError),
    /// The monitor was canceled; not an error.
    Canceled,
}

impl<T> Outcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn is_canceled(&self) -> bool {
        matches!(self, Outcome::Canceled)
    }

    pub fn ok(self) -> Option<T> {
        match self {
            Outcome::Success(value) => Some(value),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&CloudError> {
        match self {
            Outcome::Failure(err) => Some(err),
            _ => None,
        }
    }

    pub fn into_result(self) -> Result<T, RequestError> {
        match self {
            Outcome::Success(value) => Ok(value),
            Outcome::Failure(err) => Err(RequestError::Failed(err)),
            Outcome::Canceled => Err(RequestError::Canceled),
        }
    }
}

/// A labeled remote operation with its client provider, retry policy and
/// error classifier.
///
/// `run` takes `&self` and keeps all retry bookkeeping on the stack, so one
/// request can be run from several threads at once.
pub struct ClientRequest<C, T, P, O, R = NoRetry, E = ConnectionErrorClassifier> {
    label: String,
    provider: P,
    operation: O,
    policy: R,
    classifier: E,
    _types: PhantomData<fn() -> (C, T)>,
}

impl<C, T, P, O> ClientRequest<C, T, P, O>
where
    P: ClientProvider<C>,
    O: ClientOperation<C, T>,
{
    /// Create a request that attempts once and classifies connection errors
    /// with [`ConnectionErrorClassifier`]. Fails if `label` is blank.
    pub fn new(label: impl Into<String>, provider: P, operation: O) -> anyhow::Result<Self> {
        let label = label.into();
        anyhow::ensure!(!label.trim().is_empty(), "client request label must not be empty");
        Ok(Self {
            label,
            provider,
            operation,
            policy: NoRetry,
            classifier: ConnectionErrorClassifier,
            _types: PhantomData,
        })
    }
}

impl<C, T, P, O, R, E> ClientRequest<C, T, P, O, R, E>
where
    P: ClientProvider<C>,
    O: ClientOperation<C, T>,
    R: RetryPolicy,
    E: ErrorClassifier,
{
    pub fn with_policy<R2: RetryPolicy>(self, policy: R2) -> ClientRequest<C, T, P, O, R2, E> {
        ClientRequest {
            label: self.label,
            provider: self.provider,
            operation: self.operation,
            policy,
            classifier: self.classifier,
            _types: PhantomData,
        }
    }

    pub fn with_classifier<E2: ErrorClassifier>(self, classifier: E2) -> ClientRequest<C, T, P, O, R, E2> {
        ClientRequest {
            label: self.label,
            provider: self.provider,
            operation: self.operation,
            policy: self.policy,
            classifier,
            _types: PhantomData,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Run the request under a scoped slice of `monitor` (or a private
    /// monitor when `None`).
    ///
    /// Fails without attempting when no client is available. Terminal errors
    /// recognized as connection failures are re-raised as connection-class
    /// errors carrying the original as cause; others pass through unchanged.
    pub fn run(&self, monitor: Option<&ProgressMonitor>) -> Outcome<T> {
        let progress = SubMonitor::convert(monitor, &self.label, REQUEST_TOTAL_WORK);

        let client = match self.provider.get_client(&progress) {
            Ok(Some(client)) => client,
            Ok(None) => {
                tracing::warn!(label = %self.label, "no client available");
                return Outcome::Failure(CloudError::no_client(&self.label, None));
            }
            Err(e) => {
                tracing::warn!(label = %self.label, error = %e, "failed to obtain client");
                return Outcome::Failure(CloudError::no_client(&self.label, Some(e)));
            }
        };

        match self.run_and_wait(&client, &progress) {
            Outcome::Failure(error) => Outcome::Failure(self.translate(error)),
            other => other,
        }
    }

    /// Attempt the operation against `client`, reattempting per the policy.
    /// No connection-error translation happens here.
    pub fn run_and_wait(&self, client: &C, progress: &SubMonitor) -> Outcome<T> {
        run::run_with_retry(&self.policy, progress, || {
            self.operation.attempt(client, progress)
        })
    }

    fn translate(&self, error: CloudError) -> CloudError {
        match self.classifier.connection_error(&error) {
            Some(description) => {
                tracing::debug!(label = %self.label, %description, "connection failure");
                CloudError::connection(description, error)
            }
            None => error,
        }
    }
}

impl<C, T, P, O, R, E> std::fmt::Debug for ClientRequest<C, T, P, O, R, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientRequest")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}
