use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use thiserror::Error;
use tracing::{debug, info};

use crate::js_parser::JsParser;
use crate::script_parser::ScriptParser;
use crate::LanguageParser;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("missing dependency for parser: {0}")]
    MissingDependency(String),
    #[error("failed to parse {file}: {message}")]
    Syntax { file: String, message: String },
}

/// Maps file extensions to parsers. The native (default) parser is
/// always registered; additional parsers register lazily on first
/// query (§4.3) and never crash the build — only the affected file is
/// skipped on a parser error (§4.3's error policy).
pub struct ParserRegistry {
    parsers: DashMap<&'static str, std::sync::Arc<dyn LanguageParser>>,
    extension_map: DashMap<String, &'static str>,
    optional_attempted: AtomicBool,
    lite_mode: bool,
}

impl ParserRegistry {
    pub fn new(lite_mode: bool) -> Self {
        let registry = Self {
            parsers: DashMap::new(),
            extension_map: DashMap::new(),
            optional_attempted: AtomicBool::new(false),
            lite_mode,
        };
        registry.register(std::sync::Arc::new(ScriptParser));
        info!("registered parser: Python (native)");
        registry
    }

    fn register(&self, parser: std::sync::Arc<dyn LanguageParser>) {
        let lang = parser.language_name();
        for ext in parser.extensions() {
            self.extension_map.insert(ext.to_lowercase(), lang);
        }
        self.parsers.insert(lang, parser);
    }

    /// Attempts to register the optional parsers once. In lite mode
    /// (`SWARM_LITE_MODE`) this never registers anything, forcing
    /// keyword-only retrieval with only the native parser active.
    fn register_optional_parsers(&self) {
        if self.lite_mode {
            return;
        }
        self.register(std::sync::Arc::new(JsParser));
        debug!("multi-language support enabled: JavaScript");
    }

    pub fn get_parser_for_file(&self, file_path: &str) -> Option<std::sync::Arc<dyn LanguageParser>> {
        if !self.optional_attempted.swap(true, Ordering::SeqCst) {
            self.register_optional_parsers();
        }
        let ext = Path::new(file_path)
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))?;
        let lang = *self.extension_map.get(&ext)?;
        self.parsers.get(lang).map(|p| p.clone())
    }

    pub fn supported_extensions(&self) -> Vec<String> {
        if !self.optional_attempted.swap(true, Ordering::SeqCst) {
            self.register_optional_parsers();
        }
        let mut exts: Vec<String> = self.extension_map.iter().map(|e| e.key().clone()).collect();
        exts.sort();
        exts
    }

    /// Parses a single file, degrading to a skipped file with a debug
    /// log on any error rather than aborting the graph build (§4.3).
    pub fn parse_file_lenient(
        &self,
        file_path: &str,
        source: &str,
    ) -> Vec<hippoforge_contracts::AstNode> {
        match self.get_parser_for_file(file_path) {
            Some(parser) => match parser.parse_file(file_path, source) {
                Ok(nodes) => nodes,
                Err(e) => {
                    debug!(file_path, error = %e, "parser error, skipping file");
                    Vec::new()
                }
            },
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_parser_is_always_registered() {
        let registry = ParserRegistry::new(false);
        let nodes = registry.parse_file_lenient("a.py", "def alpha():\n    pass\n");
        assert_eq!(nodes.len(), 1);
    }

    #[test]
    fn lite_mode_never_registers_js_parser() {
        let registry = ParserRegistry::new(true);
        assert!(registry.get_parser_for_file("a.jsx").is_none());
    }

    #[test]
    fn unknown_extension_returns_no_parser() {
        let registry = ParserRegistry::new(false);
        assert!(registry.get_parser_for_file("a.unknownext").is_none());
    }
}
