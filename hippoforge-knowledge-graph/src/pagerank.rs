//! Manual power-iteration Personalized PageRank (§4.4), the exact shape
//! of `hipporag_retriever.py::_simple_pagerank`: avoids any
//! scipy/`petgraph`-style eigenvector solver in favor of a hand-rolled
//! power iteration with dangling-node mass redistribution through the
//! personalization vector.

use std::collections::HashMap;

use thiserror::Error;

use crate::graph::KnowledgeGraph;

#[derive(Debug, Error)]
pub enum PageRankError {
    #[error("empty graph")]
    EmptyGraph,
}

pub fn simple_pagerank(
    graph: &KnowledgeGraph,
    alpha: f64,
    personalization: &HashMap<String, f64>,
    max_iter: usize,
    tol: f64,
) -> Result<HashMap<String, f64>, PageRankError> {
    let nodes: Vec<String> = graph.node_ids().cloned().collect();
    let n = nodes.len();
    if n == 0 {
        return Err(PageRankError::EmptyGraph);
    }

    let uniform = 1.0 / n as f64;
    let mut x: HashMap<String, f64> = nodes.iter().map(|n| (n.clone(), uniform)).collect();

    let sum: f64 = personalization.values().sum();
    let p: HashMap<String, f64> = if sum == 0.0 {
        nodes.iter().map(|n| (n.clone(), uniform)).collect()
    } else {
        nodes
            .iter()
            .map(|n| (n.clone(), personalization.get(n).copied().unwrap_or(0.0) / sum))
            .collect()
    };

    for _ in 0..max_iter {
        let xlast = x.clone();
        let mut next: HashMap<String, f64> = nodes.iter().map(|n| (n.clone(), 0.0)).collect();

        let dangling_sum: f64 = nodes
            .iter()
            .filter(|n| graph.out_degree(n) == 0)
            .map(|n| xlast[n])
            .sum();

        for node in &nodes {
            let degree = graph.out_degree(node);
            if degree == 0 {
                continue;
            }
            let contribution = alpha * xlast[node] / degree as f64;
            for (neighbor, _) in graph.out_neighbors(node) {
                *next.get_mut(neighbor).expect("neighbor is a graph node") += contribution;
            }
        }

        for node in &nodes {
            let jump = (1.0 - alpha) * p[node] + alpha * dangling_sum * p[node];
            *next.get_mut(node).unwrap() += jump;
        }

        let err: f64 = nodes.iter().map(|n| (next[n] - xlast[n]).abs()).sum();
        x = next;
        if err < n as f64 * tol {
            return Ok(x);
        }
    }

    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hippoforge_contracts::NodeType;

    use crate::graph::{EdgeKind, NodeMetadata};

    fn meta(name: &str) -> NodeMetadata {
        NodeMetadata {
            file_path: "a.py".to_string(),
            node_name: name.to_string(),
            node_type: NodeType::Function,
            content: String::new(),
            start_line: 1,
            end_line: 1,
            api_route: None,
            api_calls: Vec::new(),
        }
    }

    #[test]
    fn seed_outranks_its_only_callee() {
        let mut graph = KnowledgeGraph::new();
        graph.add_node("a.py::alpha", meta("alpha"));
        graph.add_node("a.py::beta", meta("beta"));
        graph.add_edge("a.py::alpha", "a.py::beta", EdgeKind::Calls);

        let mut personalization = HashMap::new();
        personalization.insert("a.py::alpha".to_string(), 1.0);

        let scores = simple_pagerank(&graph, 0.85, &personalization, 100, 1.0e-6).unwrap();
        assert!(scores["a.py::alpha"] > scores["a.py::beta"]);
    }

    #[test]
    fn empty_graph_is_an_error() {
        let graph = KnowledgeGraph::new();
        let result = simple_pagerank(&graph, 0.85, &HashMap::new(), 100, 1.0e-6);
        assert!(matches!(result, Err(PageRankError::EmptyGraph)));
    }
}
