//! Coverage collection is itself a tool integration point (the source
//! system hard-requires the `coverage` package and refuses to construct
//! its localizer without it), so `CoverageCollector` is a named external
//! interface rather than a hand-rolled instrumenter (§3/§6): whichever
//! language-specific tool (cargo-tarpaulin, `coverage.py`, istanbul,
//! ...) is wired in implements it. `SubprocessCollector` is the
//! degraded default: it runs the test command and reports the whole
//! suite's pass/fail outcome with no per-line data, matching what the
//! source falls back to when line instrumentation isn't available.

use async_trait::async_trait;
use hippoforge_contracts::CoverageSpectrum;
use tokio::process::Command;
use tracing::info;

#[async_trait]
pub trait CoverageCollector: Send + Sync {
    async fn collect(&self, test_command: &str, cwd: &str) -> anyhow::Result<CoverageSpectrum>;
}

pub struct SubprocessCollector;

#[async_trait]
impl CoverageCollector for SubprocessCollector {
    async fn collect(&self, test_command: &str, cwd: &str) -> anyhow::Result<CoverageSpectrum> {
        info!(test_command, cwd, "running tests (no line coverage instrumentation wired in)");
        let status = Command::new("sh").arg("-c").arg(test_command).current_dir(cwd).status().await?;

        let passed = status.success();
        Ok(CoverageSpectrum {
            passed_lines: Default::default(),
            failed_lines: Default::default(),
            total_passed: if passed { 1 } else { 0 },
            total_failed: if passed { 0 } else { 1 },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn a_succeeding_command_reports_one_passed_run() {
        let spectrum = SubprocessCollector.collect("true", ".").await.unwrap();
        assert_eq!(spectrum.total_passed, 1);
        assert_eq!(spectrum.total_failed, 0);
    }

    #[tokio::test]
    async fn a_failing_command_reports_one_failed_run() {
        let spectrum = SubprocessCollector.collect("false", ".").await.unwrap();
        assert_eq!(spectrum.total_passed, 0);
        assert_eq!(spectrum.total_failed, 1);
    }
}
