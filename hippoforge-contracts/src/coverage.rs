use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestOutcome {
    Passed,
    Failed,
}

/// Coverage collected for one fault-localizer invocation. The source
/// system treats the whole suite as a single pass/fail outcome rather
/// than tracking per-test coverage, so this records one executed-lines
/// map per outcome rather than per test case.
#[derive(Debug, Clone, Default)]
pub struct CoverageSpectrum {
    /// file -> executed line numbers, for the passed-outcome run.
    pub passed_lines: HashMap<String, HashSet<u32>>,
    /// file -> executed line numbers, for the failed-outcome run.
    pub failed_lines: HashMap<String, HashSet<u32>>,
    pub total_passed: u32,
    pub total_failed: u32,
}

impl CoverageSpectrum {
    pub fn new() -> Self {
        Self::default()
    }
}
