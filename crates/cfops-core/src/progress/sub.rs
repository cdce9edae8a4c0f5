//! Scoped slice of a caller's monitor, completed when dropped.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use super::monitor::{ProgressMonitor, WaitOutcome};

/// Work scope allocated by one request. Shares cancellation with the
/// parent monitor and marks the parent task done on drop, so every exit
/// path (success, error, cancellation, panic unwinding) releases it.
#[derive(Debug)]
pub struct SubMonitor {
    monitor: ProgressMonitor,
    label: String,
    total: u32,
    worked: AtomicU32,
    done: AtomicBool,
}

impl SubMonitor {
    /// Scope `total` units of work under `parent`. Without a parent a fresh
    /// monitor is used that nobody else can cancel.
    pub fn convert(parent: Option<&ProgressMonitor>, label: &str, total: u32) -> Self {
        let monitor = parent.cloned().unwrap_or_default();
        monitor.begin_task(label, total);
        Self {
            monitor,
            label: label.to_string(),
            total,
            worked: AtomicU32::new(0),
            done: AtomicBool::new(false),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn monitor(&self) -> &ProgressMonitor {
        &self.monitor
    }

    pub fn is_canceled(&self) -> bool {
        self.monitor.is_canceled()
    }

    /// Report `units` of work, bounded by what is left in this scope.
    pub fn worked(&self, units: u32) {
        let before = self
            .worked
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |w| {
                Some(w.saturating_add(units).min(self.total))
            })
            .unwrap_or(self.total);
        let granted = before.saturating_add(units).min(self.total) - before;
        if granted > 0 {
            self.monitor.worked(granted);
        }
    }

    pub fn remaining(&self) -> u32 {
        self.total - self.worked.load(Ordering::Acquire).min(self.total)
    }

    pub fn wait(&self, timeout: Duration) -> WaitOutcome {
        self.monitor.wait(timeout)
    }

    /// Complete the scope. Idempotent.
    pub fn done(&self) {
        if !self.done.swap(true, Ordering::AcqRel) {
            self.worked.store(self.total, Ordering::Release);
            self.monitor.done();
        }
    }
}

impl Drop for SubMonitor {
    fn drop(&mut self) {
        self.done();
    }
}
