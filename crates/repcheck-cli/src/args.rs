use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    name = "repcheck",
    version,
    about = "Reproducibility scoring for research code repositories"
)]
pub struct Args {
    /// Path to a checked-out repository
    pub repo_path: PathBuf,

    /// Rule catalog (JSON); the bundled catalog when omitted
    #[arg(long, env = "REPCHECK_CATALOG")]
    pub catalog: Option<PathBuf>,

    /// Remediation table (JSON); the bundled table when omitted
    #[arg(long, env = "REPCHECK_REMEDIATION")]
    pub remediation: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "json")]
    pub format: OutputFormat,

    /// Write output to a file instead of stdout
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Opaque identifier recorded in the result, such as a commit hash
    #[arg(long, default_value = "")]
    pub source_id: String,

    /// Exit with status 1 when the score is below this value
    #[arg(long)]
    pub fail_under: Option<f64>,

    /// Evaluation threads; 0 uses every available core
    #[arg(long, env = "REPCHECK_WORKERS", default_value_t = 0)]
    pub workers: usize,

    /// Per-file read cap in bytes
    #[arg(
        long,
        env = "REPCHECK_MAX_FILE_BYTES",
        default_value_t = repcheck_core::config::DEFAULT_MAX_FILE_BYTES
    )]
    pub max_file_bytes: u64,

    /// Total read budget in bytes
    #[arg(
        long,
        env = "REPCHECK_MAX_TOTAL_BYTES",
        default_value_t = repcheck_core::config::DEFAULT_MAX_TOTAL_BYTES
    )]
    pub max_total_bytes: u64,

    /// Wall-clock budget in milliseconds; 0 disables it
    #[arg(long, env = "REPCHECK_TIME_BUDGET_MS", default_value_t = 30_000)]
    pub time_budget_ms: u64,
}

impl Args {
    pub fn engine_config(&self) -> repcheck_core::config::EngineConfig {
        repcheck_core::config::EngineConfig {
            workers: self.workers,
            max_file_bytes: self.max_file_bytes,
            max_total_bytes: self.max_total_bytes,
            time_budget_ms: (self.time_budget_ms > 0).then_some(self.time_budget_ms),
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
    Badge,
}
