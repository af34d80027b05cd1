use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use repcheck_core::engine::Engine;
use repcheck_core::repo::budget::CancellationToken;
use repcheck_core::report::model::{Provenance, ToolInfo};
use repcheck_core::report::render;
use repcheck_core::rules::catalog::RuleCatalog;
use repcheck_core::scoring::recommend::RemediationTable;
use repcheck_core::{analyze_path, default_catalog, default_remediation};

mod args;

fn main() -> Result<()> {
    // Logs go to stderr so JSON on stdout stays parseable.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args = args::Args::parse();

    let catalog = match &args.catalog {
        Some(path) => load_catalog(path)?,
        None => default_catalog().context("bundled catalog is invalid")?,
    };
    let remediation = match &args.remediation {
        Some(path) => load_remediation(path)?,
        None => default_remediation().context("bundled remediation table is invalid")?,
    };

    let tool = ToolInfo {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };
    let engine = Engine::new(Arc::new(catalog), Arc::new(remediation), args.engine_config())?
        .with_tool(tool);
    tracing::info!(
        repo = %args.repo_path.display(),
        catalog = %engine.catalog().info().version,
        rules = engine.catalog().rule_count(),
        "starting analysis"
    );

    let provenance = Provenance::new(
        args.source_id.clone(),
        chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
    );
    let result = analyze_path(&args.repo_path, &engine, CancellationToken::new(), provenance)?;

    let output = match args.format {
        args::OutputFormat::Json => serde_json::to_string_pretty(&result)?,
        args::OutputFormat::Text => render::render_text(&result),
        args::OutputFormat::Badge => render::render_badge(&result),
    };

    match &args.out {
        Some(path) => std::fs::write(path, &output)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => print!("{output}"),
    }

    let below = args
        .fail_under
        .is_some_and(|min| result.overall_score < min);
    std::process::exit(if below { 1 } else { 0 });
}

fn load_catalog(path: &Path) -> Result<RuleCatalog> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read catalog {}", path.display()))?;
    RuleCatalog::from_json_str(&raw)
        .with_context(|| format!("invalid catalog {}", path.display()))
}

fn load_remediation(path: &Path) -> Result<RemediationTable> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read remediation table {}", path.display()))?;
    RemediationTable::from_json_str(&raw)
        .with_context(|| format!("invalid remediation table {}", path.display()))
}
