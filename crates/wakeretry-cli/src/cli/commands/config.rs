//! `wakeretry config` – show effective retry settings.

use anyhow::Result;
use wakeretry_core::config::{self, WakeretryConfig};

pub fn run_config(cfg: &WakeretryConfig) -> Result<()> {
    let retry = cfg.retry_config();
    println!("config: {}", config::config_path()?.display());
    println!(
        "delays (ms): {:?}  jitter < {} ms  attempts: {}",
        retry.delays_ms,
        retry.jitter_max_ms,
        retry.delays_ms.len() + 1
    );
    println!("retryable codes: {}", retry.retryable_codes.join(", "));
    println!("message patterns:");
    for p in &retry.message_patterns {
        println!("  {}", p);
    }
    Ok(())
}
