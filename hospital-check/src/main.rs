//! hospital-check - schema, seed and metadata check for the hospital tables
//!
//! Connects to the configured store, creates the doctor, patient and
//! treatment tables, seeds them, verifies data and metadata, and drops
//! everything again. Exits non-zero if any check fails or the store cannot
//! be reached.

use anyhow::{Context, Result};
use clap::Parser;
use hospital_common::config::resolve_config;
use hospital_common::{run_cycles, SuiteReport};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

/// Create, seed, verify and drop the hospital schema
#[derive(Debug, Parser)]
#[command(name = "hospital-check", version, about)]
struct Args {
    /// Database URL (postgres:// or sqlite:)
    ///
    /// Falls back to HOSPITAL_DATABASE_URL, then the config file.
    #[arg(long)]
    database_url: Option<String>,

    /// TOML config file with a `database_url` key
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of full create/seed/verify/drop cycles
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    cycles: u32,

    /// Print the report as JSON instead of text
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting hospital-check v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Returns whether every cycle passed
async fn run(args: Args) -> Result<bool> {
    let config = resolve_config(args.database_url.as_deref(), args.config.as_deref())?;
    info!("Database: {}", config.redacted_url());

    let reports = run_cycles(&config, args.cycles as usize)
        .await
        .context("Check run aborted")?;

    if args.json {
        let summaries: Vec<_> = reports.iter().map(SuiteReport::summary).collect();
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    } else {
        for (cycle, report) in reports.iter().enumerate() {
            print_report(cycle + 1, report);
        }
    }

    let passed = reports.iter().all(SuiteReport::passed);
    let consistent = reports.windows(2).all(|w| w[0].summary() == w[1].summary());
    if !consistent {
        error!("Cycles produced different results");
    }

    Ok(passed && consistent)
}

fn print_report(cycle: usize, report: &SuiteReport) {
    println!("Cycle {}:", cycle);
    for check in &report.checks {
        match &check.result {
            Ok(()) => println!("  ok    {}", check.name),
            Err(e) => println!("  FAIL  {}: {}", check.name, e),
        }
    }
    for failure in &report.teardown_failures {
        println!("  warn  teardown: {}", failure);
    }

    let failed = report.failures().count();
    println!("  {} passed, {} failed", report.checks.len() - failed, failed);
}

#[cfg(test)]
mod tests {
    use super::*;
    use hospital_common::config::DATABASE_URL_ENV;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["hospital-check"]).unwrap();
        assert_eq!(args.cycles, 1);
        assert!(!args.json);
        assert!(args.config.is_none());
    }

    #[test]
    fn test_args_cycles_must_be_positive() {
        assert!(Args::try_parse_from(["hospital-check", "--cycles", "0"]).is_err());

        let args = Args::try_parse_from(["hospital-check", "--cycles", "2", "--json"]).unwrap();
        assert_eq!(args.cycles, 2);
        assert!(args.json);
    }

    #[tokio::test]
    async fn test_run_against_sqlite_memory() {
        let args = Args::try_parse_from([
            "hospital-check",
            "--database-url",
            "sqlite::memory:",
            "--cycles",
            "2",
        ])
        .unwrap();

        assert!(run(args).await.unwrap());
    }

    #[tokio::test]
    #[serial]
    async fn test_blank_env_var_falls_back_to_config_file() {
        let mut config = NamedTempFile::new().unwrap();
        config
            .write_all(b"database_url = \"sqlite::memory:\"\n")
            .unwrap();

        for blank in ["  ", ""] {
            std::env::set_var(DATABASE_URL_ENV, blank);
            let args = Args::try_parse_from([
                "hospital-check",
                "--config",
                config.path().to_str().unwrap(),
            ])
            .unwrap();
            assert!(args.database_url.is_none());

            let result = run(args).await;
            std::env::remove_var(DATABASE_URL_ENV);
            assert!(result.unwrap(), "blank {:?} should fall through to the config file", blank);
        }
    }
}
