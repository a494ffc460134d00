//! C3: language parsers. A `ParserRegistry` maps file extensions to
//! parsers; the default (native, scripting-language) parser is always
//! registered, additional parsers register lazily and degrade to
//! "no parser" rather than crash on a missing dependency.

mod api_edges;
mod js_parser;
mod react_heuristic;
mod registry;
mod script_parser;

pub use api_edges::normalize_client_api_call;
pub use registry::{ParseError, ParserRegistry};

use hippoforge_contracts::AstNode;

/// The interface every language-specific parser implements (§4.3).
pub trait LanguageParser: Send + Sync {
    fn extensions(&self) -> &[&'static str];
    fn language_name(&self) -> &'static str;
    fn parse_file(&self, file_path: &str, source: &str) -> Result<Vec<AstNode>, ParseError>;
}
