//! Ochiai spectrum-based fault localization (§4.7), grounded on
//! `ochiai_localizer.py::OchiaiLocalizer.calculate_suspiciousness` /
//! `get_top_suspicious_lines`.

use hippoforge_contracts::CoverageSpectrum;

#[derive(Debug, Clone)]
pub struct SuspiciousLine {
    pub file: String,
    pub line: u32,
    pub score: f64,
}

/// `S(l) = failed(l) / sqrt(totalFailed * (failed(l) + passed(l)))`,
/// zero when the line was never executed by a failing run or the
/// denominator is zero. The whole-suite treatment means `failed(l)` and
/// `passed(l)` are each 0 or 1 here (per-run, not per-test).
pub fn calculate_suspiciousness(spectrum: &CoverageSpectrum) -> Vec<SuspiciousLine> {
    let mut files: Vec<&String> = spectrum
        .passed_lines
        .keys()
        .chain(spectrum.failed_lines.keys())
        .collect();
    files.sort();
    files.dedup();

    let mut scores = Vec::new();
    for file in files {
        let passed = spectrum.passed_lines.get(file);
        let failed = spectrum.failed_lines.get(file);

        let mut lines: Vec<u32> = passed
            .into_iter()
            .flatten()
            .chain(failed.into_iter().flatten())
            .copied()
            .collect();
        lines.sort_unstable();
        lines.dedup();

        for line in lines {
            let failed_count = if failed.is_some_and(|s| s.contains(&line)) { 1u32 } else { 0 };
            let passed_count = if passed.is_some_and(|s| s.contains(&line)) { 1u32 } else { 0 };

            let score = if failed_count == 0 {
                0.0
            } else {
                let denominator =
                    ((spectrum.total_failed * (failed_count + passed_count)) as f64).sqrt();
                if denominator == 0.0 {
                    0.0
                } else {
                    failed_count as f64 / denominator
                }
            };

            scores.push(SuspiciousLine { file: file.clone(), line, score });
        }
    }

    scores
}

/// Ranks by score descending, truncated to `top_k`.
pub fn top_suspicious_lines(spectrum: &CoverageSpectrum, top_k: usize) -> Vec<SuspiciousLine> {
    let mut scores = calculate_suspiciousness(spectrum);
    scores.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    scores.truncate(top_k);
    scores
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};

    fn spectrum(
        failed_lines: &[u32],
        passed_lines: &[u32],
        total_failed: u32,
        total_passed: u32,
    ) -> CoverageSpectrum {
        let mut failed: HashMap<String, HashSet<u32>> = HashMap::new();
        failed.insert("a.py".to_string(), failed_lines.iter().copied().collect());
        let mut passed: HashMap<String, HashSet<u32>> = HashMap::new();
        passed.insert("a.py".to_string(), passed_lines.iter().copied().collect());
        CoverageSpectrum {
            passed_lines: passed,
            failed_lines: failed,
            total_passed,
            total_failed,
        }
    }

    #[test]
    fn a_line_only_hit_by_the_failing_run_scores_maximum() {
        let s = spectrum(&[10], &[], 1, 0);
        let scores = calculate_suspiciousness(&s);
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].line, 10);
        assert_eq!(scores[0].score, 1.0);
    }

    #[test]
    fn a_line_never_hit_by_a_failing_run_scores_zero() {
        let s = spectrum(&[], &[7], 1, 1);
        let scores = calculate_suspiciousness(&s);
        assert_eq!(scores[0].score, 0.0);
    }

    #[test]
    fn a_line_hit_by_both_runs_scores_between_zero_and_one() {
        let s = spectrum(&[5], &[5], 1, 1);
        let scores = calculate_suspiciousness(&s);
        // failed=1, passed=1, total_failed=1 -> 1/sqrt(1*2) = 0.707...
        assert!((scores[0].score - (1.0 / 2f64.sqrt())).abs() < 1e-9);
    }

    #[test]
    fn top_k_truncates_and_sorts_descending() {
        let s = spectrum(&[1, 2, 3], &[], 1, 0);
        let ranked = top_suspicious_lines(&s, 2);
        assert_eq!(ranked.len(), 2);
        assert!(ranked[0].score >= ranked[1].score);
    }
}
