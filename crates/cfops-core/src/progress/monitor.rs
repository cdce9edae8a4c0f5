//! Shared cancel token with work accounting and a cancelable timed wait.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Why [`ProgressMonitor::wait`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The full duration elapsed.
    Elapsed,
    /// Woken early by [`ProgressMonitor::interrupt`]; not a cancellation.
    Interrupted,
    /// The monitor was canceled before or during the wait.
    Canceled,
}

#[derive(Debug, Default)]
struct State {
    task: Option<String>,
    total_work: u32,
    worked: u32,
    done: bool,
    interrupts: u64,
}

#[derive(Debug, Default)]
struct Inner {
    canceled: AtomicBool,
    state: Mutex<State>,
    wake: Condvar,
}

/// Caller-owned progress and cancellation handle. Clones share the same
/// cancel flag and progress state.
#[derive(Debug, Clone, Default)]
pub struct ProgressMonitor {
    inner: Arc<Inner>,
}

impl ProgressMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Wakes any thread blocked in [`wait`](Self::wait).
    pub fn cancel(&self) {
        self.inner.canceled.store(true, Ordering::SeqCst);
        let _state = self.lock();
        self.inner.wake.notify_all();
    }

    pub fn is_canceled(&self) -> bool {
        self.inner.canceled.load(Ordering::SeqCst)
    }

    /// Wake a thread blocked in [`wait`](Self::wait) without canceling.
    pub fn interrupt(&self) {
        let mut state = self.lock();
        state.interrupts = state.interrupts.wrapping_add(1);
        self.inner.wake.notify_all();
    }

    /// Block for up to `timeout`, returning early on cancel or interrupt.
    /// A timeout too large to form a deadline waits until one of those.
    pub fn wait(&self, timeout: Duration) -> WaitOutcome {
        let deadline = Instant::now().checked_add(timeout);
        let mut state = self.lock();
        let seen = state.interrupts;
        loop {
            if self.is_canceled() {
                return WaitOutcome::Canceled;
            }
            if state.interrupts != seen {
                return WaitOutcome::Interrupted;
            }
            state = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return WaitOutcome::Elapsed;
                    }
                    self.inner
                        .wake
                        .wait_timeout(state, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
                None => self
                    .inner
                    .wake
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner),
            };
        }
    }

    /// Start a task with the given nominal amount of work; resets prior progress.
    pub fn begin_task(&self, label: &str, total_work: u32) {
        let mut state = self.lock();
        state.task = Some(label.to_string());
        state.total_work = total_work;
        state.worked = 0;
        state.done = false;
    }

    /// Report `units` of work; never exceeds the task total.
    pub fn worked(&self, units: u32) {
        let mut state = self.lock();
        state.worked = state.worked.saturating_add(units).min(state.total_work);
    }

    /// Mark the current task complete.
    pub fn done(&self) {
        let mut state = self.lock();
        state.worked = state.total_work;
        state.done = true;
    }

    pub fn task(&self) -> Option<String> {
        self.lock().task.clone()
    }

    pub fn total_work(&self) -> u32 {
        self.lock().total_work
    }

    pub fn work_completed(&self) -> u32 {
        self.lock().worked
    }

    pub fn is_done(&self) -> bool {
        self.lock().done
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
