//! `Embedder` is a named external-collaborator interface (§3/§6's
//! embedding-provider, out of scope here): the pruner depends only on
//! this trait, never on a concrete HTTP client, and degrades to FIFO
//! whenever no provider is configured.

use async_trait::async_trait;

#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>>;
}
