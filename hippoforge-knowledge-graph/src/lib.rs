//! C4: knowledge graph built from parsed ASTs, retrieved by Personalized
//! PageRank over a query's seed nodes.

mod build;
mod cache;
mod graph;
mod pagerank;
mod route;

pub use build::build_graph_from_ast;
pub use cache::{load_cache, save_cache, CACHE_VERSION};
pub use graph::{ContextChunk, EdgeKind, GraphError, KnowledgeGraph, NodeMetadata};
pub use route::normalize_route;
