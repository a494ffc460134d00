//! C5: provenance-log pruning with tail preservation and embedding-based
//! (or FIFO-fallback) relevance selection.

mod embedder;
mod pruner;

pub use embedder::Embedder;
pub use pruner::{ContextPruner, DEFAULT_KEEP_RELEVANT, DEFAULT_KEEP_TAIL};
