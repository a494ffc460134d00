//! C12: the Decompose -> Analyze -> Synthesize deliberation loop,
//! grounded on spec.md §4.13 and `tools/dynamic/deliberation.py`.

mod collaborators;
mod engine;

pub use collaborators::{LlmProvider, NullVerifier, VerifyOutcome, Verifier};
pub use engine::run_deliberation;
