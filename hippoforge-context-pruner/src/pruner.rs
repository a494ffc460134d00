//! Tail-preservation + top-K relevance pruning of the provenance log
//! (§4.5), grounded on `context_pruner.py::ContextPruner.prune`. Always
//! keeps the last `keep_tail` entries as the output's suffix; selects
//! the rest either by cosine similarity against an embedding provider,
//! or by FIFO when no provider is configured or embedding fails.

use std::sync::Arc;

use hippoforge_contracts::AuthorSignature;
use tracing::{error, info};

use crate::embedder::Embedder;

pub const DEFAULT_KEEP_TAIL: usize = 10;
pub const DEFAULT_KEEP_RELEVANT: usize = 20;

pub struct ContextPruner {
    provider: Option<Arc<dyn Embedder>>,
}

impl ContextPruner {
    pub fn new(provider: Option<Arc<dyn Embedder>>) -> Self {
        Self { provider }
    }

    pub async fn prune(
        &self,
        log: &[AuthorSignature],
        query: &str,
        keep_tail: usize,
        keep_relevant: usize,
    ) -> Vec<AuthorSignature> {
        if log.is_empty() {
            return Vec::new();
        }

        let total_keep = keep_tail + keep_relevant;
        if log.len() <= total_keep {
            return log.to_vec();
        }

        let tail = log[log.len() - keep_tail..].to_vec();
        let candidates = &log[..log.len() - keep_tail];

        let Some(provider) = &self.provider else {
            info!("ContextPruner: no embedding provider, using FIFO fallback");
            return fifo_fallback(log, total_keep);
        };

        match self.select_relevant(provider.as_ref(), query, candidates, keep_relevant).await {
            Ok(selected) => {
                info!(
                    original = log.len(),
                    kept = selected.len() + tail.len(),
                    "ContextPruner: pruned by relevance"
                );
                let mut result = selected;
                result.extend(tail);
                result
            }
            Err(e) => {
                error!(error = %e, "ContextPruner failed, falling back to FIFO");
                fifo_fallback(log, total_keep)
            }
        }
    }

    async fn select_relevant(
        &self,
        provider: &dyn Embedder,
        query: &str,
        candidates: &[AuthorSignature],
        keep_relevant: usize,
    ) -> anyhow::Result<Vec<AuthorSignature>> {
        let query_embedding = provider.embed(&[query]).await?.pop().ok_or_else(|| {
            anyhow::anyhow!("embedding provider returned no vector for the query")
        })?;

        let texts: Vec<String> = candidates
            .iter()
            .map(|c| format!("{} {} {:?}", c.action, c.artifact.as_deref().unwrap_or(""), c.role))
            .collect();
        let text_refs: Vec<&str> = texts.iter().map(|s| s.as_str()).collect();
        let candidate_embeddings = provider.embed(&text_refs).await?;

        let mut scored: Vec<(usize, f64)> = candidate_embeddings
            .iter()
            .enumerate()
            .map(|(i, emb)| (i, cosine_similarity(&query_embedding, emb)))
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        let mut top_indices: Vec<usize> = scored.into_iter().take(keep_relevant).map(|(i, _)| i).collect();
        top_indices.sort_unstable();

        Ok(top_indices.into_iter().map(|i| candidates[i].clone()).collect())
    }
}

fn fifo_fallback(log: &[AuthorSignature], total_keep: usize) -> Vec<AuthorSignature> {
    let start = log.len().saturating_sub(total_keep);
    log[start..].to_vec()
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| *x as f64 * *y as f64).sum();
    let mag_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let mag_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }
    dot / (mag_a * mag_b)
}
