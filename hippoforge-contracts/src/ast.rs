use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeType {
    Function,
    Method,
    Class,
    Interface,
    Struct,
    Trait,
    Module,
    Component,
    Type,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApiEdgeKind {
    /// A backend handler whose route decorator matched.
    Route,
    /// A client callable whose `fetch`/`axios` argument matched `/api`.
    Call,
}

/// A uniform AST node produced by any language parser, per §4.3.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AstNode {
    pub name: String,
    pub node_type: NodeType,
    pub file: String,
    pub start_line: u32,
    pub end_line: u32,
    pub content: String,
    pub calls: Vec<String>,
    pub inherits: Vec<String>,
    pub renders: Vec<String>,
    pub hooks: Vec<String>,
    pub framework_role: Option<String>,
    pub api_route: Option<String>,
    pub api_calls: Vec<String>,
}

impl AstNode {
    pub fn new(name: impl Into<String>, node_type: NodeType, file: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            node_type,
            file: file.into(),
            start_line: 1,
            end_line: 1,
            content: String::new(),
            calls: Vec::new(),
            inherits: Vec::new(),
            renders: Vec::new(),
            hooks: Vec::new(),
            framework_role: None,
            api_route: None,
            api_calls: Vec::new(),
        }
    }

    /// The `<file>::<name>` node id used throughout the knowledge graph.
    pub fn node_id(&self) -> String {
        format!("{}::{}", self.file, self.name)
    }
}
