//! Progress reporting and cooperative cancellation for client requests.
//!
//! A [`ProgressMonitor`] is owned by the caller and may be shared (cloned)
//! with whoever is allowed to cancel the work. A request scopes its own
//! work budget with [`SubMonitor::convert`]; the scope is completed when
//! it is dropped.

mod monitor;
mod sub;

pub use monitor::{ProgressMonitor, WaitOutcome};
pub use sub::SubMonitor;

/// Nominal work units a client request allocates for itself.
pub const REQUEST_TOTAL_WORK: u32 = 100;
