pub mod attributes;
pub mod freeform;
mod jsp;

pub use attributes::{MergedAttributes, format_attributes, merge_attributes};
pub use freeform::FreeformKind;
pub use jsp::JspGenerator;

use crate::ast::Document;
use crate::error::CompileError;

/// Generator trait - converts a line tree to output markup
pub trait Generator {
    fn generate(&self, document: &Document) -> Result<String, CompileError>;
}
