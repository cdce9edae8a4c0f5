//! CLI for the cfops remote operation executor.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use cfops_core::config;

use commands::{run_show_config, run_simulate, FailureMode, SimulateOptions};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "cfops")]
#[command(about = "cfops: run remote platform operations with retries", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Run an operation against a simulated flaky platform. Ctrl-C cancels.
    Simulate {
        /// Label of the operation (shown in progress and errors).
        #[arg(long, default_value = "simulated operation")]
        label: String,
        /// Number of attempts that fail before the platform answers.
        #[arg(long, default_value = "0", value_name = "N")]
        failures: u32,
        /// Kind of failure the platform produces.
        #[arg(long, value_enum, default_value = "operation")]
        fail_with: FailureMode,
        /// Wait between attempts in milliseconds (overrides config).
        #[arg(long, value_name = "MS")]
        interval_ms: Option<u64>,
        /// Total wait budget in milliseconds (overrides config).
        #[arg(long, value_name = "MS")]
        total_wait_ms: Option<u64>,
        /// Time each attempt takes in milliseconds.
        #[arg(long, default_value = "0", value_name = "MS")]
        latency_ms: u64,
        /// Simulate a provider that cannot supply a client.
        #[arg(long)]
        no_client: bool,
    },

    /// Show the config file path and effective request settings.
    Config,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Simulate {
                label,
                failures,
                fail_with,
                interval_ms,
                total_wait_ms,
                latency_ms,
                no_client,
            } => {
                let mut request_cfg = cfg.request.clone();
                if interval_ms.is_some() {
                    request_cfg.wait_interval_ms = interval_ms;
                }
                if let Some(total) = total_wait_ms {
                    request_cfg.total_wait_ms = total;
                }
                let opts = SimulateOptions {
                    label,
                    failures,
                    fail_with,
                    latency_ms,
                    no_client,
                };
                run_simulate(opts, &request_cfg).await?;
            }
            CliCommand::Config => run_show_config(&cfg)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
