//! `cfops config` – show where the config lives and what it resolves to.

use anyhow::Result;
use cfops_core::config::{self, CfopsConfig};

pub fn run_show_config(cfg: &CfopsConfig) -> Result<()> {
    let path = config::config_path()?;
    println!("config: {}", path.display());
    println!("request.total_wait_ms = {}", cfg.request.total_wait_ms);
    match cfg.request.wait_interval_ms {
        Some(ms) => println!("request.wait_interval_ms = {}", ms),
        None => println!("request.wait_interval_ms = (unset, no retries)"),
    }
    println!("request.retry_on = {:?}", cfg.request.retry_on);
    Ok(())
}
