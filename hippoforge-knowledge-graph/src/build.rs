//! Graph construction from parsed ASTs (§4.4), grounded on
//! `hipporag_retriever.py::build_graph_from_ast` / `_add_ast_node` /
//! `_create_api_edges`: walk a root directory by the registry's
//! supported extensions, parse each file leniently (a parser error
//! skips only that file), add one graph node per `AstNode`, and finally
//! connect client `api_calls` to backend `api_route` handlers across
//! files via route normalization.

use std::collections::HashMap;
use std::path::Path;

use hippoforge_parsers::ParserRegistry;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::graph::{EdgeKind, KnowledgeGraph, NodeMetadata};
use crate::route::normalize_route;

pub fn build_graph_from_ast(root: &Path, registry: &ParserRegistry) -> KnowledgeGraph {
    let mut graph = KnowledgeGraph::new();
    let extensions = registry.supported_extensions();

    let mut files_processed = 0u32;
    for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let matches_extension = path
            .extension()
            .map(|ext| extensions.iter().any(|e| e.trim_start_matches('.') == ext.to_string_lossy()))
            .unwrap_or(false);
        if !matches_extension {
            continue;
        }

        let file_path = path.to_string_lossy().to_string();
        let source = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                debug!(file = %file_path, error = %e, "could not read file, skipping");
                continue;
            }
        };

        let nodes = registry.parse_file_lenient(&file_path, &source);
        for node in nodes {
            add_ast_node(&mut graph, &file_path, node);
        }
        files_processed += 1;
    }

    create_api_edges(&mut graph);
    info!(files_processed, nodes = graph.len(), "built knowledge graph");
    graph
}

fn add_ast_node(graph: &mut KnowledgeGraph, file_path: &str, node: hippoforge_contracts::AstNode) {
    let node_id = node.node_id();

    graph.add_node(
        &node_id,
        NodeMetadata {
            file_path: file_path.to_string(),
            node_name: node.name.clone(),
            node_type: node.node_type,
            content: node.content.clone(),
            start_line: node.start_line,
            end_line: node.end_line,
            api_route: node.api_route.clone(),
            api_calls: node.api_calls.clone(),
        },
    );

    for callee in &node.calls {
        graph.add_edge(&node_id, &format!("{}::{}", file_path, callee), EdgeKind::Calls);
    }
    for base in &node.inherits {
        graph.add_edge(&node_id, &format!("{}::{}", file_path, base), EdgeKind::Inherits);
    }
    for rendered in &node.renders {
        graph.add_edge(&node_id, &format!("{}::{}", file_path, rendered), EdgeKind::Renders);
    }
}

/// Connects client `fetch`/`axios` calls to the backend handler whose
/// decorator route normalizes to the same string (§4.4). The route →
/// handler index is built once up front from every node's `api_route`.
fn create_api_edges(graph: &mut KnowledgeGraph) {
    let mut route_handlers: HashMap<String, String> = HashMap::new();
    for (node_id, meta) in graph.metadata() {
        if let Some(route) = &meta.api_route {
            route_handlers.insert(normalize_route(route), node_id.clone());
        }
    }
    if route_handlers.is_empty() {
        return;
    }

    let callers: Vec<(String, Vec<String>)> = graph
        .metadata()
        .iter()
        .map(|(id, meta)| (id.clone(), meta.api_calls.clone()))
        .collect();

    let mut edge_count = 0u32;
    for (node_id, api_calls) in callers {
        for url in api_calls {
            let normalized = normalize_route(&url);
            if let Some(handler_id) = route_handlers.get(&normalized) {
                graph.add_edge(&node_id, handler_id, EdgeKind::CallsApi);
                edge_count += 1;
            }
        }
    }
    if edge_count > 0 {
        info!(edge_count, "created API edges (frontend -> backend)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn tempdir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "hfg-kg-{}-{}-{}",
            name,
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn builds_a_call_edge_between_two_functions_in_one_file() {
        let dir = tempdir("calls");
        fs::write(dir.join("a.py"), "def alpha():\n    beta()\n\ndef beta():\n    pass\n").unwrap();

        let registry = ParserRegistry::new(true);
        let graph = build_graph_from_ast(&dir, &registry);

        let alpha_id = format!("{}::alpha", dir.join("a.py").to_string_lossy());
        let beta_id = format!("{}::beta", dir.join("a.py").to_string_lossy());
        assert!(graph.node_exists(&alpha_id));
        assert!(graph.node_exists(&beta_id));
        assert_eq!(graph.out_degree(&alpha_id), 1);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn connects_a_client_fetch_call_to_its_backend_handler() {
        let dir = tempdir("apiedges");
        fs::write(
            dir.join("server.py"),
            "@app.get(\"/api/users\")\ndef list_users():\n    pass\n",
        )
        .unwrap();
        fs::write(
            dir.join("client.js"),
            "function loadUsers() {\n  fetch('/api/users');\n}\n",
        )
        .unwrap();

        let registry = ParserRegistry::new(false);
        let graph = build_graph_from_ast(&dir, &registry);

        let caller_id = format!("{}::loadUsers", dir.join("client.js").to_string_lossy());
        let neighbors = graph.out_neighbors(&caller_id);
        assert!(neighbors.iter().any(|(_, kind)| matches!(kind, EdgeKind::CallsApi)));

        fs::remove_dir_all(&dir).ok();
    }
}
