//! Optional parser for JavaScript/TypeScript/JSX/TSX, grounded on
//! `javascript_parser.py`'s function/component extraction but expressed
//! with `regex` rather than tree-sitter, since no tree-sitter grammar
//! crate is part of this workspace's dependency stack; lite mode (§1.3)
//! never registers this parser at all.

use once_cell::sync::Lazy;
use regex::Regex;

use hippoforge_contracts::{AstNode, NodeType};

use crate::api_edges::extract_client_api_calls;
use crate::react_heuristic::{hooks_used, is_component, rendered_components};
use crate::registry::ParseError;
use crate::LanguageParser;

static FUNCTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^\s*(?:export\s+)?(?:default\s+)?function\s+(?P<name>[A-Za-z_$][A-Za-z0-9_$]*)\s*\(",
    )
    .unwrap()
});
static ARROW_CONST_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^\s*(?:export\s+)?const\s+(?P<name>[A-Za-z_$][A-Za-z0-9_$]*)\s*=\s*(\([^)]*\)|[A-Za-z_$][A-Za-z0-9_$]*)\s*=>",
    )
    .unwrap()
});
static CALL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?P<name>[A-Za-z_$][A-Za-z0-9_$]*)\s*\(").unwrap());

pub struct JsParser;

impl LanguageParser for JsParser {
    fn extensions(&self) -> &[&'static str] {
        &[".js", ".jsx", ".ts", ".tsx"]
    }

    fn language_name(&self) -> &'static str {
        "JavaScript"
    }

    fn parse_file(&self, file_path: &str, source: &str) -> Result<Vec<AstNode>, ParseError> {
        let lines: Vec<&str> = source.lines().collect();
        let mut nodes = Vec::new();

        for caps in FUNCTION_RE.captures_iter(source) {
            let name = caps["name"].to_string();
            let start_line = line_number_of(source, caps.get(0).unwrap().start());
            nodes.push(build_node(file_path, &lines, name, start_line));
        }
        for caps in ARROW_CONST_RE.captures_iter(source) {
            let name = caps["name"].to_string();
            let start_line = line_number_of(source, caps.get(0).unwrap().start());
            nodes.push(build_node(file_path, &lines, name, start_line));
        }

        Ok(nodes)
    }
}

fn build_node(file_path: &str, lines: &[&str], name: String, start_line: usize) -> AstNode {
    let end_line = brace_block_end(lines, start_line);
    let content = lines[(start_line - 1)..end_line.min(lines.len())].join("\n");
    let calls = extract_calls(&content);
    let is_comp = is_component(&name, &content);

    let mut node = AstNode::new(name, if is_comp { NodeType::Component } else { NodeType::Function }, file_path);
    node.start_line = start_line as u32;
    node.end_line = end_line as u32;
    node.content = content.clone();
    node.calls = calls;
    node.api_calls = extract_client_api_calls(&content);
    if is_comp {
        node.renders = rendered_components(&content);
        node.hooks = hooks_used(&content);
        node.framework_role = Some("component".to_string());
    }
    node
}

fn brace_block_end(lines: &[&str], start_line: usize) -> usize {
    let mut depth = 0i32;
    let mut opened = false;
    for (offset, line) in lines.iter().enumerate().skip(start_line - 1) {
        for ch in line.chars() {
            match ch {
                '{' => {
                    depth += 1;
                    opened = true;
                }
                '}' => depth -= 1,
                _ => {}
            }
        }
        if opened && depth <= 0 {
            return offset + 1;
        }
    }
    lines.len()
}

fn extract_calls(content: &str) -> Vec<String> {
    let keywords = ["if", "for", "while", "switch", "function", "return", "catch"];
    CALL_RE
        .captures_iter(content)
        .map(|c| c["name"].to_string())
        .filter(|name| !keywords.contains(&name.as_str()))
        .collect()
}

fn line_number_of(source: &str, byte_offset: usize) -> usize {
    source[..byte_offset].matches('\n').count() + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_a_react_component_and_its_renders() {
        let source = "function Button() {\n  return <Icon />;\n}\n";
        let nodes = JsParser.parse_file("Button.jsx", source).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].node_type, NodeType::Component);
        assert_eq!(nodes[0].renders, vec!["Icon".to_string()]);
    }

    #[test]
    fn plain_function_is_not_a_component() {
        let source = "function add(a, b) {\n  return a + b;\n}\n";
        let nodes = JsParser.parse_file("math.js", source).unwrap();
        assert_eq!(nodes[0].node_type, NodeType::Function);
    }
}
