//! Versioned cache persistence for the built graph (§4.4, §9 redesign):
//! replaces the source system's pickle blob tagged with the literal
//! string `"1.0"` with `hippoforge_caching`'s magic-prefixed binary
//! codec. A version mismatch forces the caller to rebuild rather than
//! trust a stale or foreign blob.

use std::path::Path;

use hippoforge_caching::CacheError;

use crate::graph::KnowledgeGraph;

pub const CACHE_VERSION: u32 = 1;

pub fn save_cache(path: &Path, graph: &KnowledgeGraph) -> Result<(), CacheError> {
    let bytes = hippoforge_caching::encode(graph, CACHE_VERSION)?;
    std::fs::write(path, bytes).map_err(|_| CacheError::Truncated)
}

pub fn load_cache(path: &Path) -> Result<KnowledgeGraph, CacheError> {
    let bytes = std::fs::read(path).map_err(|_| CacheError::Truncated)?;
    hippoforge_caching::decode(&bytes, CACHE_VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EdgeKind, NodeMetadata};
    use hippoforge_contracts::NodeType;

    fn sample_graph() -> KnowledgeGraph {
        let mut graph = KnowledgeGraph::new();
        graph.add_node(
            "a.py::alpha",
            NodeMetadata {
                file_path: "a.py".to_string(),
                node_name: "alpha".to_string(),
                node_type: NodeType::Function,
                content: "def alpha(): pass".to_string(),
                start_line: 1,
                end_line: 1,
                api_route: None,
                api_calls: Vec::new(),
            },
        );
        graph.add_edge("a.py::alpha", "a.py::beta", EdgeKind::Calls);
        graph
    }

    #[test]
    fn round_trips_a_graph_through_the_cache_file() {
        let dir = std::env::temp_dir().join(format!(
            "hfg-kg-cache-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("graph.cache");

        let graph = sample_graph();
        save_cache(&path, &graph).unwrap();
        let loaded = load_cache(&path).unwrap();

        assert_eq!(loaded.len(), graph.len());
        assert!(loaded.node_exists("a.py::alpha"));

        std::fs::remove_dir_all(&dir).ok();
    }
}
