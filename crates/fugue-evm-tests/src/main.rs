//! # fugue-vmtest
//!
//! Runs interpreter fixtures from a file or a directory.
//!
//! ```bash
//! fugue-vmtest crates/fugue-evm-tests/fixtures
//! fugue-vmtest --revision London fixtures/state.json
//! fugue-vmtest --trace fixtures/arithmetic.json
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use fugue_evm::Revision;
use fugue_evm_tests::TestRunner;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Fixture runner for the fugue EVM
#[derive(Parser, Debug)]
#[command(name = "fugue-vmtest")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Fixture file or directory
    path: PathBuf,

    /// Revision for fixtures that do not name one
    #[arg(long, default_value_t = Revision::Cancun)]
    revision: Revision,

    /// Print every step of every case as JSON instead of a summary
    #[arg(long)]
    trace: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let mut runner = TestRunner::new(cli.revision, cli.verbose);
    if cli.trace {
        runner = runner.with_trace();
    }
    let stats = runner
        .run_path(&cli.path)
        .with_context(|| format!("running fixtures in {}", cli.path.display()))?;

    if cli.trace {
        let cases: Vec<_> = stats
            .traces
            .iter()
            .map(|(name, steps)| serde_json::json!({ "name": name, "steps": steps }))
            .collect();
        let report = serde_json::json!({
            "passed": stats.passed,
            "failed": stats.failed,
            "cases": cases,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("serializing trace")?
        );
    } else {
        stats.print_summary();
    }

    if !stats.all_passed() {
        std::process::exit(1);
    }
    Ok(())
}
