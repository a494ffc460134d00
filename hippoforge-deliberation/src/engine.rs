use std::time::Instant;

use hippoforge_contracts::{DeliberationResult, DeliberationStep};
use hippoforge_knowledge_graph::KnowledgeGraph;
use tracing::instrument;

use crate::collaborators::{LlmProvider, Verifier};

/// `runDeliberation(problem, context, constraints, steps)` (§4.13):
/// Decompose, Analyze, then Synthesize only if `steps >= 3`. Each stage's
/// duration is recorded regardless of outcome.
#[instrument(skip(graph, llm, verifier))]
pub async fn run_deliberation(
    problem: &str,
    context: &str,
    constraints: &[String],
    steps: u32,
    graph: Option<&KnowledgeGraph>,
    llm: &dyn LlmProvider,
    verifier: &dyn Verifier,
) -> DeliberationResult {
    let mut trace = Vec::new();

    let decompose_start = Instant::now();
    let sub_problems = decompose(problem, context, graph);
    trace.push(DeliberationStep {
        step: 1,
        name: "Decompose".to_string(),
        worker: if graph.is_some() { "knowledge-graph" } else { "none" }.to_string(),
        output: sub_problems.join("\n"),
        duration_ms: decompose_start.elapsed().as_millis() as u64,
    });

    let analyze_start = Instant::now();
    let (analysis_output, workers_engaged) = analyze(&sub_problems, steps, verifier);
    trace.push(DeliberationStep {
        step: 2,
        name: "Analyze".to_string(),
        worker: workers_engaged,
        output: analysis_output.clone(),
        duration_ms: analyze_start.elapsed().as_millis() as u64,
    });

    if steps < 3 {
        return DeliberationResult {
            steps: trace,
            final_answer: analysis_output,
            confidence: 0.0,
        };
    }

    let synth_start = Instant::now();
    let prompt = synthesis_prompt(problem, &sub_problems, &analysis_output, constraints);

    match llm.generate(&prompt, 0.5, 500).await {
        Ok(answer) => {
            trace.push(DeliberationStep {
                step: 3,
                name: "Synthesize".to_string(),
                worker: "llm".to_string(),
                output: answer.clone(),
                duration_ms: synth_start.elapsed().as_millis() as u64,
            });
            DeliberationResult {
                steps: trace,
                final_answer: answer,
                confidence: 0.8,
            }
        }
        Err(e) => {
            let message = format!("synthesis failed: {e}");
            trace.push(DeliberationStep {
                step: 3,
                name: "Synthesize".to_string(),
                worker: "llm".to_string(),
                output: message.clone(),
                duration_ms: synth_start.elapsed().as_millis() as u64,
            });
            DeliberationResult {
                steps: trace,
                final_answer: message,
                confidence: 0.0,
            }
        }
    }
}

/// Retrieves top-5 chunks from the knowledge graph as sub-problems, or
/// falls back to the single whole-problem sub-problem list (§4.13 step 1).
fn decompose(problem: &str, context: &str, graph: Option<&KnowledgeGraph>) -> Vec<String> {
    if let Some(graph) = graph {
        let query = if context.is_empty() {
            problem.to_string()
        } else {
            format!("{problem} {context}")
        };
        let chunks = graph.retrieve_context(&query, 5, 0.85);
        if !chunks.is_empty() {
            return chunks
                .iter()
                .map(|chunk| {
                    let truncated: String = chunk.content.chars().take(100).collect();
                    format!("{}: {truncated}", chunk.node_name)
                })
                .collect();
        }
    }
    vec![problem.to_string()]
}

/// Routes each sub-problem to a worker by keyword (§4.13 step 2): "debug"
/// engages the fault localizer, "verify" engages the verifier adapter,
/// anything else gets a generic analysis note.
fn analyze(sub_problems: &[String], steps: u32, verifier: &dyn Verifier) -> (String, String) {
    let mut lines = Vec::new();
    let mut workers = Vec::new();

    for sub_problem in sub_problems.iter().take(steps as usize) {
        let lower = sub_problem.to_lowercase();

        let (worker, note) = if lower.contains("debug") {
            (
                "fault-localizer",
                hippoforge_fault_localizer::generate_debug_prompt(&[], None),
            )
        } else if lower.contains("verify") {
            let outcome = verifier.verify(sub_problem);
            ("verifier", format!("verification outcome: {outcome:?}"))
        } else {
            (
                "generic",
                "recorded for synthesis, no specialized worker matched".to_string(),
            )
        };

        if !workers.contains(&worker) {
            workers.push(worker);
        }
        lines.push(format!("{sub_problem} => {note}"));
    }

    (lines.join("\n"), workers.join("+"))
}

fn synthesis_prompt(
    problem: &str,
    sub_problems: &[String],
    analysis_output: &str,
    constraints: &[String],
) -> String {
    let constraints_str = if constraints.is_empty() {
        "None".to_string()
    } else {
        constraints.join(", ")
    };
    format!(
        "Synthesize these analyses into a final recommendation:\n\n\
         Problem: {problem}\n\n\
         Sub-problems:\n{}\n\n\
         Analyses:\n{analysis_output}\n\n\
         Constraints: {constraints_str}\n\n\
         Provide a clear, actionable recommendation.",
        sub_problems.join("\n")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{NullVerifier, VerifyOutcome};
    use async_trait::async_trait;

    struct EchoLlm;

    #[async_trait]
    impl LlmProvider for EchoLlm {
        async fn generate(&self, prompt: &str, _temperature: f64, _max_tokens: usize) -> anyhow::Result<String> {
            Ok(format!("answer to: {}", prompt.lines().next().unwrap_or_default()))
        }
    }

    struct FailingLlm;

    #[async_trait]
    impl LlmProvider for FailingLlm {
        async fn generate(&self, _prompt: &str, _temperature: f64, _max_tokens: usize) -> anyhow::Result<String> {
            Err(anyhow::anyhow!("llm unreachable"))
        }
    }

    struct AlwaysSupported;

    impl Verifier for AlwaysSupported {
        fn verify(&self, _claim: &str) -> VerifyOutcome {
            VerifyOutcome::Supported
        }
    }

    #[tokio::test]
    async fn fewer_than_three_steps_skips_synthesis() {
        let result = run_deliberation("fix the bug", "", &[], 2, None, &EchoLlm, &NullVerifier).await;
        assert_eq!(result.steps.len(), 2);
        assert_eq!(result.confidence, 0.0);
    }

    #[tokio::test]
    async fn three_or_more_steps_runs_synthesis_and_sets_confidence() {
        let result = run_deliberation("fix the bug", "", &[], 3, None, &EchoLlm, &NullVerifier).await;
        assert_eq!(result.steps.len(), 3);
        assert_eq!(result.steps[2].name, "Synthesize");
        assert_eq!(result.confidence, 0.8);
    }

    #[tokio::test]
    async fn a_failing_synthesis_call_produces_zero_confidence() {
        let result = run_deliberation("fix the bug", "", &[], 3, None, &FailingLlm, &NullVerifier).await;
        assert_eq!(result.confidence, 0.0);
        assert!(result.final_answer.contains("synthesis failed"));
    }

    #[tokio::test]
    async fn debug_keyword_routes_to_the_fault_localizer_worker() {
        let result = run_deliberation("debug the crash", "", &[], 3, None, &EchoLlm, &NullVerifier).await;
        assert!(result.steps[1].worker.contains("fault-localizer"));
    }

    #[tokio::test]
    async fn verify_keyword_routes_to_the_verifier_worker() {
        let result = run_deliberation("verify the claim", "", &[], 3, None, &EchoLlm, &AlwaysSupported).await;
        assert!(result.steps[1].worker.contains("verifier"));
        assert!(result.steps[1].output.contains("Supported"));
    }

    #[tokio::test]
    async fn no_graph_falls_back_to_the_whole_problem_as_one_sub_problem() {
        let result = run_deliberation("a plain problem", "", &[], 1, None, &EchoLlm, &NullVerifier).await;
        assert_eq!(result.steps[0].output, "a plain problem");
    }
}
