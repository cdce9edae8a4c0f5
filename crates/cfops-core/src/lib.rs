pub mod config;
pub mod error;
pub mod logging;
pub mod progress;
pub mod request;

pub use error::{CloudError, CloudErrorKind, RequestError};
pub use progress::{ProgressMonitor, SubMonitor, WaitOutcome};
pub use request::{
    ClientOperation, ClientProvider, ClientRequest, ConnectionErrorClassifier, ErrorClassifier,
    FixedInterval, NoRetry, Outcome, RetryOn, RetryPolicy,
};
