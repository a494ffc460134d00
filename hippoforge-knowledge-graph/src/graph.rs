use std::collections::{HashMap, HashSet};

use hippoforge_contracts::NodeType;
use thiserror::Error;
use tracing::{error, info};

use crate::pagerank::simple_pagerank;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("graph not built")]
    NotBuilt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum EdgeKind {
    Calls,
    Inherits,
    Renders,
    CallsApi,
    RelatedTo,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct NodeMetadata {
    pub file_path: String,
    pub node_name: String,
    pub node_type: NodeType,
    pub content: String,
    pub start_line: u32,
    pub end_line: u32,
    pub api_route: Option<String>,
    pub api_calls: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ContextChunk {
    pub file_path: String,
    pub node_name: String,
    pub node_type: NodeType,
    pub content: String,
    pub ppr_score: f64,
    pub start_line: u32,
    pub end_line: u32,
}

/// The built graph: a node set, an adjacency list of out-edges, and rich
/// per-node metadata keyed by `<file>::<name>` (§4.4). Serializable as a
/// whole so the cache can round-trip it without re-parsing source.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct KnowledgeGraph {
    nodes: HashSet<String>,
    edges: HashMap<String, Vec<(String, EdgeKind)>>,
    metadata: HashMap<String, NodeMetadata>,
}

impl KnowledgeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node_id: impl Into<String>, meta: NodeMetadata) {
        let id = node_id.into();
        self.nodes.insert(id.clone());
        self.metadata.insert(id, meta);
    }

    /// Ensures the id is present in the node set even without metadata,
    /// so edges pointing at not-yet-visited targets still resolve.
    pub fn ensure_node(&mut self, node_id: &str) {
        if !self.nodes.contains(node_id) {
            self.nodes.insert(node_id.to_string());
        }
    }

    pub fn add_edge(&mut self, from: &str, to: &str, kind: EdgeKind) {
        self.ensure_node(from);
        self.ensure_node(to);
        self.edges.entry(from.to_string()).or_default().push((to.to_string(), kind));
    }

    pub fn node_exists(&self, node_id: &str) -> bool {
        self.nodes.contains(node_id)
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &String> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn out_degree(&self, node_id: &str) -> usize {
        self.edges.get(node_id).map(|v| v.len()).unwrap_or(0)
    }

    pub fn out_neighbors(&self, node_id: &str) -> &[(String, EdgeKind)] {
        self.edges.get(node_id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Adds `related_to` edges from an external symbol-entity mapping.
    /// Only connects pairs where both ends already exist in the graph
    /// (§4.4's semantic-edges rule).
    pub fn add_semantic_edges(&mut self, entities: &HashMap<String, Vec<String>>) {
        let mut added = 0;
        for (source, targets) in entities {
            if !self.node_exists(source) {
                continue;
            }
            for target in targets {
                if self.node_exists(target) {
                    self.edges
                        .entry(source.clone())
                        .or_default()
                        .push((target.clone(), EdgeKind::RelatedTo));
                    added += 1;
                }
            }
        }
        info!(added, "added semantic edges");
    }

    /// Finds seed nodes by case-insensitive substring match of `query`
    /// against the symbol part of each node id (§4.4).
    fn find_seed_nodes(&self, query: &str) -> Vec<String> {
        let query_lower = query.to_lowercase();
        self.nodes
            .iter()
            .filter(|id| {
                id.rsplit("::")
                    .next()
                    .map(|name| name.to_lowercase().contains(&query_lower))
                    .unwrap_or(false)
            })
            .cloned()
            .collect()
    }

    /// Personalized PageRank retrieval over seed nodes matching `query`
    /// (§4.4). Returns the top `top_k` nodes by score, or an empty
    /// vector if no seeds match or PageRank itself fails.
    pub fn retrieve_context(&self, query: &str, top_k: usize, alpha: f64) -> Vec<ContextChunk> {
        let seeds = self.find_seed_nodes(query);
        if seeds.is_empty() {
            return Vec::new();
        }

        let weight = 1.0 / seeds.len() as f64;
        let personalization: HashMap<String, f64> =
            seeds.iter().map(|s| (s.clone(), weight)).collect();

        let scores = match simple_pagerank(self, alpha, &personalization, 100, 1.0e-6) {
            Ok(scores) => scores,
            Err(e) => {
                error!(error = %e, "pagerank failed");
                return Vec::new();
            }
        };

        let mut ranked: Vec<(String, f64)> = scores.into_iter().collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(top_k);

        ranked
            .into_iter()
            .filter_map(|(node_id, score)| {
                self.metadata.get(&node_id).map(|meta| ContextChunk {
                    file_path: meta.file_path.clone(),
                    node_name: meta.node_name.clone(),
                    node_type: meta.node_type,
                    content: meta.content.clone(),
                    ppr_score: score,
                    start_line: meta.start_line,
                    end_line: meta.end_line,
                })
            })
            .collect()
    }

    pub fn metadata(&self) -> &HashMap<String, NodeMetadata> {
        &self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(file: &str, name: &str, node_type: NodeType) -> NodeMetadata {
        NodeMetadata {
            file_path: file.to_string(),
            node_name: name.to_string(),
            node_type,
            content: format!("def {}(): pass", name),
            start_line: 1,
            end_line: 1,
            api_route: None,
            api_calls: Vec::new(),
        }
    }

    #[test]
    fn retrieve_context_ranks_the_seed_strictly_above_its_callee() {
        let mut graph = KnowledgeGraph::new();
        graph.add_node("a.py::alpha", meta("a.py", "alpha", NodeType::Function));
        graph.add_node("b.py::beta", meta("b.py", "beta", NodeType::Function));
        graph.add_edge("a.py::alpha", "b.py::beta", EdgeKind::Calls);

        let results = graph.retrieve_context("alpha", 2, 0.85);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].node_name, "alpha");
        assert_eq!(results[1].node_name, "beta");
        assert!(results[0].ppr_score > results[1].ppr_score);
    }

    #[test]
    fn no_matching_seed_returns_empty() {
        let mut graph = KnowledgeGraph::new();
        graph.add_node("a.py::alpha", meta("a.py", "alpha", NodeType::Function));
        assert!(graph.retrieve_context("nonexistent", 5, 0.85).is_empty());
    }

    #[test]
    fn semantic_edges_require_both_endpoints_present() {
        let mut graph = KnowledgeGraph::new();
        graph.add_node("a.py::alpha", meta("a.py", "alpha", NodeType::Function));
        let mut entities = HashMap::new();
        entities.insert("a.py::alpha".to_string(), vec!["missing::node".to_string()]);
        graph.add_semantic_edges(&entities);
        assert_eq!(graph.out_degree("a.py::alpha"), 0);
    }
}
