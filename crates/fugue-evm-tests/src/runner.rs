//! Directory walking and statistics

use crate::error::TestResult;
use crate::vm_test::{VmTestResults, VmTestRunner};
use fugue_evm::{Revision, StepRecord};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::debug;

/// Aggregated fixture statistics
#[derive(Debug, Default)]
pub struct TestStats {
    /// Cases executed
    pub total: usize,
    /// Cases passed
    pub passed: usize,
    /// Cases failed
    pub failed: usize,
    /// Files that could not be read or parsed
    pub unreadable: usize,
    /// Total execution time
    pub duration: Duration,
    /// Failed case names with reasons
    pub failures: Vec<(String, String)>,
    /// Step traces, when recorded
    pub traces: Vec<(String, Vec<StepRecord>)>,
}

impl TestStats {
    /// Create empty stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the results of one file
    pub fn add_results(&mut self, results: VmTestResults) {
        self.total += results.total();
        self.passed += results.passed.len();
        self.failed += results.failed.len();
        self.failures.extend(results.failed);
        self.traces.extend(results.traces);
    }

    /// Whether every case passed and every file was readable
    pub fn all_passed(&self) -> bool {
        self.failed == 0 && self.unreadable == 0
    }

    /// Pass rate as percentage
    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        (self.passed as f64 / self.total as f64) * 100.0
    }

    /// Print summary
    pub fn print_summary(&self) {
        println!("\n========================================");
        println!("Fixture Summary");
        println!("========================================");
        println!("Total:      {}", self.total);
        println!("Passed:     {}", self.passed);
        println!("Failed:     {}", self.failed);
        println!("Unreadable: {}", self.unreadable);
        println!("Pass Rate:  {:.2}%", self.pass_rate());
        println!("Duration:   {:.2}s", self.duration.as_secs_f64());

        if !self.failures.is_empty() {
            println!("\nFailed cases:");
            for (name, reason) in &self.failures {
                println!("  - {}: {}", name, reason);
            }
        }
    }
}

/// Runs every fixture file under a path
pub struct TestRunner {
    vm_runner: VmTestRunner,
}

impl TestRunner {
    /// Create new runner
    pub fn new(revision: Revision, verbose: bool) -> Self {
        Self {
            vm_runner: VmTestRunner::new(revision, verbose),
        }
    }

    /// Record step traces for every case
    pub fn with_trace(mut self) -> Self {
        self.vm_runner = self.vm_runner.with_trace();
        self
    }

    /// Run a fixture file, or every `.json` file below a directory
    pub fn run_path(&self, path: &Path) -> TestResult<TestStats> {
        let mut stats = TestStats::new();
        let start = Instant::now();

        if path.is_dir() {
            self.run_dir(path, &mut stats)?;
        } else {
            stats.add_results(self.vm_runner.run_file(path)?);
        }

        stats.duration = start.elapsed();
        Ok(stats)
    }

    fn run_dir(&self, dir: &Path, stats: &mut TestStats) -> TestResult<()> {
        let mut entries = std::fs::read_dir(dir)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<Result<Vec<_>, _>>()?;
        entries.sort();

        for path in entries {
            if path.is_dir() {
                self.run_dir(&path, stats)?;
            } else if path.extension().is_some_and(|e| e == "json") {
                match self.vm_runner.run_file(&path) {
                    Ok(results) => {
                        debug!(
                            file = %results.file,
                            passed = results.passed.len(),
                            failed = results.failed.len(),
                            "fixture file done"
                        );
                        stats.add_results(results);
                    }
                    Err(e) => {
                        tracing::warn!("unreadable fixture {}: {}", path.display(), e);
                        stats.unreadable += 1;
                        stats
                            .failures
                            .push((path.display().to_string(), e.to_string()));
                    }
                }
            }
        }
        Ok(())
    }
}
