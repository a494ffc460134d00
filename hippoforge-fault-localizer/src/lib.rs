//! C7: spectrum-based fault localization over a whole-suite pass/fail
//! outcome, ranked by the Ochiai formula.

mod collector;
mod ochiai;
mod prompt;

pub use collector::{CoverageCollector, SubprocessCollector};
pub use ochiai::{calculate_suspiciousness, top_suspicious_lines, SuspiciousLine};
pub use prompt::generate_debug_prompt;

use tracing::info;

/// Collect → rank → render, per §4.7. Returns "no fault localization
/// needed" without ranking if every test passed.
pub async fn run_full_sbfl_analysis(
    collector: &dyn CoverageCollector,
    test_command: &str,
    cwd: &str,
    top_k: usize,
) -> anyhow::Result<String> {
    let spectrum = collector.collect(test_command, cwd).await?;

    if spectrum.total_failed == 0 {
        return Ok("All tests passed. No fault localization needed.".to_string());
    }

    let top_lines = top_suspicious_lines(&spectrum, top_k);
    let prompt = generate_debug_prompt(&top_lines, None);
    info!(count = top_lines.len(), "SBFL analysis complete");
    Ok(prompt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hippoforge_contracts::CoverageSpectrum;

    struct AllPassedCollector;

    #[async_trait]
    impl CoverageCollector for AllPassedCollector {
        async fn collect(&self, _test_command: &str, _cwd: &str) -> anyhow::Result<CoverageSpectrum> {
            Ok(CoverageSpectrum { total_passed: 1, total_failed: 0, ..Default::default() })
        }
    }

    #[tokio::test]
    async fn all_tests_passing_skips_ranking() {
        let result = run_full_sbfl_analysis(&AllPassedCollector, "pytest", ".", 5).await.unwrap();
        assert_eq!(result, "All tests passed. No fault localization needed.");
    }
}
