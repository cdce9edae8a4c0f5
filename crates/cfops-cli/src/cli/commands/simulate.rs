//! `cfops simulate` – run a client request against an in-process flaky platform.

use anyhow::{Context, Result};
use cfops_core::config::RequestConfig;
use cfops_core::{ClientRequest, CloudError, Outcome, ProgressMonitor, RetryPolicy, SubMonitor};
use clap::ValueEnum;
use std::io;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// What the simulated platform fails with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FailureMode {
    /// Generic operation error.
    Operation,
    /// Connection refused at the socket level.
    Connection,
    /// HTTP 503 from the platform API.
    Server,
}

impl FailureMode {
    fn error(self, attempt: u32) -> anyhow::Error {
        match self {
            FailureMode::Operation => anyhow::anyhow!("simulated failure on attempt {}", attempt),
            FailureMode::Connection => {
                io::Error::new(io::ErrorKind::ConnectionRefused, "simulated connection refused")
                    .into()
            }
            FailureMode::Server => CloudError::http(
                503,
                format!("503 Service Unavailable (attempt {})", attempt),
            )
            .into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SimulateOptions {
    pub label: String,
    pub failures: u32,
    pub fail_with: FailureMode,
    pub latency_ms: u64,
    pub no_client: bool,
}

/// Connected session to the simulated platform.
#[derive(Debug)]
struct SimulatedSession {
    failures: u32,
    mode: FailureMode,
    latency: Duration,
    calls: AtomicU32,
}

impl SimulatedSession {
    fn call(&self, label: &str) -> anyhow::Result<String> {
        thread::sleep(self.latency);
        let attempt = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt <= self.failures {
            return Err(self.mode.error(attempt));
        }
        Ok(format!("{}: completed after {} attempt(s)", label, attempt))
    }
}

/// Build and run the request on the current thread.
fn run_simulation(
    opts: &SimulateOptions,
    policy: Box<dyn RetryPolicy + Send + Sync>,
    monitor: &ProgressMonitor,
) -> Result<Outcome<String>> {
    let session = Arc::new(SimulatedSession {
        failures: opts.failures,
        mode: opts.fail_with,
        latency: Duration::from_millis(opts.latency_ms),
        calls: AtomicU32::new(0),
    });
    let no_client = opts.no_client;
    let label = opts.label.clone();

    let request = ClientRequest::new(
        opts.label.clone(),
        move |_: &SubMonitor| -> anyhow::Result<Option<Arc<SimulatedSession>>> {
            Ok((!no_client).then(|| Arc::clone(&session)))
        },
        move |client: &Arc<SimulatedSession>, progress: &SubMonitor| -> anyhow::Result<String> {
            progress.worked(10);
            client.call(&label)
        },
    )?
    .with_policy(policy);

    Ok(request.run(Some(monitor)))
}

pub async fn run_simulate(opts: SimulateOptions, request_cfg: &RequestConfig) -> Result<()> {
    tracing::info!(
        label = %opts.label,
        failures = opts.failures,
        mode = ?opts.fail_with,
        config = ?request_cfg,
        "starting simulation"
    );
    let policy = request_cfg.policy();
    let label = opts.label.clone();

    let monitor = ProgressMonitor::new();
    let worker_monitor = monitor.clone();
    let mut task =
        tokio::task::spawn_blocking(move || run_simulation(&opts, policy, &worker_monitor));

    let outcome = tokio::select! {
        joined = &mut task => joined??,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupt received; canceling request");
            monitor.cancel();
            task.await??
        }
    };

    let summary = outcome
        .into_result()
        .with_context(|| format!("request '{}'", label))?;
    println!("{}", summary);
    Ok(())
}
