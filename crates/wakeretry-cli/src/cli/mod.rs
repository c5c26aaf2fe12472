//! CLI for inspecting and exercising the wakeretry policy.

mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use wakeretry_core::config;

use commands::{run_classify, run_config, run_simulate};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "wakeretry")]
#[command(about = "wakeretry: retry policy for serverless database cold starts", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

/// Shape of the failure a simulated cold database reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FailureKind {
    /// Connection never established.
    Connection,
    /// Structured client error code (see --code).
    Code,
    /// Uncoded failure with a network-ish message.
    Message,
    /// Non-transient failure (unique constraint violation).
    Permanent,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Show the config file path and the effective retry settings.
    Config,

    /// Classify a described failure as retryable or not.
    Classify {
        /// Failure message text.
        message: String,

        /// Structured error code reported by the client, if any.
        #[arg(long)]
        code: Option<String>,

        /// Treat the failure as a connection/initialization failure.
        #[arg(long)]
        init: bool,
    },

    /// Run a simulated cold-starting database call through the retry loop.
    Simulate {
        /// Number of failing calls before the database answers.
        #[arg(long, default_value = "3", value_name = "N")]
        failures: usize,

        /// Kind of failure reported while cold.
        #[arg(long, value_enum, default_value = "connection")]
        kind: FailureKind,

        /// Error code used with `--kind code`.
        #[arg(long, default_value = "P1001")]
        code: String,

        /// Override the configured schedule with one fixed-delay retry (milliseconds).
        #[arg(long, value_name = "MS")]
        fixed_ms: Option<u64>,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);
        let policy = cfg.retry_policy().context("building retry policy")?;

        match cli.command {
            CliCommand::Config => run_config(&cfg)?,
            CliCommand::Classify {
                message,
                code,
                init,
            } => run_classify(&policy, &message, code, init),
            CliCommand::Simulate {
                failures,
                kind,
                code,
                fixed_ms,
            } => run_simulate(policy, failures, kind, &code, fixed_ms).await?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
