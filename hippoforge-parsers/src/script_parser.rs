//! The always-registered native parser, grounded on
//! `python_parser.py`'s regex-shaped extraction (functions, classes with
//! bases, calls by name, and `@app.get("/api/...")`-style route
//! decorators) but expressed over raw source text with `regex` instead
//! of `ast.walk`, since no Python AST is available here.

use once_cell::sync::Lazy;
use regex::Regex;

use hippoforge_contracts::{AstNode, NodeType};

use crate::registry::ParseError;
use crate::LanguageParser;

static DEF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^(?P<indent>\s*)def\s+(?P<name>[A-Za-z_][A-Za-z0-9_]*)\s*\(").unwrap());
static CLASS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^class\s+(?P<name>[A-Za-z_][A-Za-z0-9_]*)\s*(\((?P<bases>[^)]*)\))?\s*:").unwrap()
});
static CALL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?P<name>[A-Za-z_][A-Za-z0-9_]*)\s*\(").unwrap());
static DECORATOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?m)^\s*@\w+\.(get|post|put|delete|patch|route)\(\s*["'](?P<route>/api[^"']*)["']"#,
    )
    .unwrap()
});

pub struct ScriptParser;

impl LanguageParser for ScriptParser {
    fn extensions(&self) -> &[&'static str] {
        &[".py", ".pyw"]
    }

    fn language_name(&self) -> &'static str {
        "Python"
    }

    fn parse_file(&self, file_path: &str, source: &str) -> Result<Vec<AstNode>, ParseError> {
        let lines: Vec<&str> = source.lines().collect();
        let mut nodes = Vec::new();

        for caps in CLASS_RE.captures_iter(source) {
            let name = caps["name"].to_string();
            let bases: Vec<String> = caps
                .name("bases")
                .map(|m| {
                    m.as_str()
                        .split(',')
                        .map(|b| b.trim().trim_start_matches(|c: char| !c.is_alphanumeric() && c != '_'))
                        .filter(|b| !b.is_empty())
                        .map(unqualify)
                        .collect()
                })
                .unwrap_or_default();
            let start_line = line_number_of(source, caps.get(0).unwrap().start());
            let end_line = block_end_line(&lines, start_line);
            let content = slice_lines(&lines, start_line, end_line);
            let calls = extract_calls(&content);

            let mut node = AstNode::new(name, NodeType::Class, file_path);
            node.start_line = start_line as u32;
            node.end_line = end_line as u32;
            node.content = content;
            node.inherits = bases;
            node.calls = calls;
            nodes.push(node);
        }

        for caps in DEF_RE.captures_iter(source) {
            let name = caps["name"].to_string();
            let start_line = line_number_of(source, caps.get(0).unwrap().start());
            let end_line = block_end_line(&lines, start_line);
            let content = slice_lines(&lines, start_line, end_line);
            let calls = extract_calls(&content);
            let api_route = extract_api_route(&lines, start_line);

            let mut node = AstNode::new(name, NodeType::Function, file_path);
            node.start_line = start_line as u32;
            node.end_line = end_line as u32;
            node.content = content;
            node.calls = calls;
            node.api_route = api_route;
            nodes.push(node);
        }

        Ok(nodes)
    }
}

fn unqualify(name: &str) -> String {
    name.rsplit('.').next().unwrap_or(name).to_string()
}

fn line_number_of(source: &str, byte_offset: usize) -> usize {
    source[..byte_offset].matches('\n').count() + 1
}

/// Scans forward from `start_line` (1-based) while subsequent
/// non-blank lines are indented further than the definition line,
/// matching the block-by-indentation shape `python_parser.py` gets for
/// free from `ast`.
fn block_end_line(lines: &[&str], start_line: usize) -> usize {
    let start_idx = start_line - 1;
    let def_indent = indent_of(lines.get(start_idx).copied().unwrap_or(""));
    let mut end = start_line;
    for (offset, line) in lines.iter().enumerate().skip(start_idx + 1) {
        if line.trim().is_empty() {
            continue;
        }
        if indent_of(line) <= def_indent {
            break;
        }
        end = offset + 1;
    }
    end
}

fn indent_of(line: &str) -> usize {
    line.chars().take_while(|c| *c == ' ' || *c == '\t').count()
}

fn slice_lines(lines: &[&str], start: usize, end: usize) -> String {
    lines[(start - 1)..end.min(lines.len())].join("\n")
}

fn extract_calls(content: &str) -> Vec<String> {
    let keywords = ["if", "for", "while", "return", "def", "class", "with", "elif"];
    CALL_RE
        .captures_iter(content)
        .map(|c| c["name"].to_string())
        .filter(|name| !keywords.contains(&name.as_str()))
        .collect()
}

fn extract_api_route(lines: &[&str], start_line: usize) -> Option<String> {
    let mut idx = start_line.saturating_sub(1);
    while idx > 0 {
        idx -= 1;
        let line = lines.get(idx)?;
        let trimmed = line.trim();
        if trimmed.starts_with('@') {
            if let Some(caps) = DECORATOR_RE.captures(line) {
                return Some(caps["route"].to_string());
            }
            continue;
        }
        break;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_a_function_and_its_call() {
        let source = "def alpha():\n    beta()\n";
        let nodes = ScriptParser.parse_file("a.py", source).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].name, "alpha");
        assert_eq!(nodes[0].calls, vec!["beta".to_string()]);
    }

    #[test]
    fn extracts_class_bases() {
        let source = "class Dog(Animal, Loggable):\n    pass\n";
        let nodes = ScriptParser.parse_file("a.py", source).unwrap();
        assert_eq!(nodes[0].inherits, vec!["Animal".to_string(), "Loggable".to_string()]);
    }

    #[test]
    fn extracts_api_route_from_decorator() {
        let source = "@app.get(\"/api/users\")\ndef list_users():\n    pass\n";
        let nodes = ScriptParser.parse_file("a.py", source).unwrap();
        assert_eq!(nodes[0].api_route.as_deref(), Some("/api/users"));
    }
}
