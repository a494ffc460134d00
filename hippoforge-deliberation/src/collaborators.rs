use async_trait::async_trait;

/// The out-of-scope LLM boundary (§3/§6 non-goal). Reused by the git
/// workflow in `hippoforge-kernel` for its commit-message and PR prompts
/// so the two components share one trait at this seam instead of each
/// declaring its own.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn generate(&self, prompt: &str, temperature: f64, max_tokens: usize) -> anyhow::Result<String>;
}

/// Outcome of the aspirational Z3-like verifier (§9 open question).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    Supported,
    Refuted,
    Unsupported,
}

/// The verifier adapter boundary. `NullVerifier` is the only shipped
/// implementation; it always reports `Unsupported`, matching
/// `z3_verifier.py`'s role as a stub in the original.
pub trait Verifier: Send + Sync {
    fn verify(&self, claim: &str) -> VerifyOutcome;
}

pub struct NullVerifier;

impl Verifier for NullVerifier {
    fn verify(&self, _claim: &str) -> VerifyOutcome {
        VerifyOutcome::Unsupported
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_verifier_always_reports_unsupported() {
        assert_eq!(NullVerifier.verify("anything"), VerifyOutcome::Unsupported);
    }
}
