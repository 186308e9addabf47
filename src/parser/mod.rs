pub mod attributes;
pub mod indentation;
pub mod literal;
pub mod scanner;
mod tree_builder;

pub use scanner::{Position, Scanner, Span};
use tree_builder::TreeBuilder;

use crate::ast::Document;
use crate::error::CompileError;
use std::sync::Arc;
use tracing::debug;

/// Parser trait - converts source text to a line tree
pub trait Parser {
    fn parse(&self, source: &str) -> Result<Document, CompileError>;
}

/// Haml-syntax parser
pub struct HamlParser {
    // Configuration only, no state; each parse gets its own scanner
}

impl HamlParser {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for HamlParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for HamlParser {
    fn parse(&self, source: &str) -> Result<Document, CompileError> {
        // Scan
        let lines = Scanner::new(source).scan()?;

        // Nest
        let tree = TreeBuilder::new(lines).build()?;
        debug!(top_level = tree.len(), "built line tree");

        Ok(Document::new(tree, Arc::from(source)))
    }
}
