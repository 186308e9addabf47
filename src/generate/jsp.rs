use tracing::debug;

use super::Generator;
use super::attributes::{format_attributes, merge_attributes};
use super::freeform::FreeformKind;
use crate::ast::*;
use crate::config::Config;
use crate::error::{CompileError, ErrorKind, Result};
use crate::html;

/// Renders a line tree as HTML with JSP expressions and scriptlets.
pub struct JspGenerator<'a> {
    config: &'a Config,
}

impl<'a> JspGenerator<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Render each line, skipping lines that produce no output
    fn render_lines(&self, lines: &[Line]) -> Result<Vec<String>> {
        let mut rendered = Vec::with_capacity(lines.len());
        for line in lines {
            if let Some(text) = self.render_line(line)? {
                rendered.push(text);
            }
        }
        Ok(rendered)
    }

    fn render_line(&self, line: &Line) -> Result<Option<String>> {
        match &line.kind {
            LineKind::Element(element) => self.render_element(element, line.span).map(Some),
            LineKind::Freeform(freeform) => self.render_freeform(freeform, line.span),
            LineKind::Blank => Ok(None),
        }
    }

    /// Children of a line, indented one level. `None` when nothing renders.
    fn render_block(&self, lines: &[Line]) -> Result<Option<String>> {
        let rendered = self.render_lines(lines)?;
        if rendered.is_empty() {
            return Ok(None);
        }
        Ok(Some(indent(&rendered.join("\n"))))
    }

    fn render_element(&self, element: &Element, span: Span) -> Result<String> {
        if !html::is_legal_tag(&element.tag) {
            return Err(CompileError::new(
                ErrorKind::IllegalTag,
                format!("illegal element: '{}' is not a valid tag name", element.tag),
                element.tag_span,
            ));
        }

        let attributes = merge_attributes(&element.attributes, &element.ids, &element.classes, span)?;
        let attributes = format_attributes(&attributes, self.config.format);

        let content = match &element.content {
            Content::Empty => String::new(),
            Content::Inline(text) => FreeformKind::classify(text)
                .render(None, self.config, span)?
                .unwrap_or_default(),
            Content::Nested(lines) => match self.render_block(lines)? {
                Some(block) => format!("\n{}\n", block),
                None => String::new(),
            },
            Content::Raw(lines) => lines.join("\n"),
        };

        let self_closing = element.self_closing || (self.config.is_autoclose(&element.tag) && content.is_empty());
        if self_closing {
            if !content.is_empty() {
                return Err(CompileError::new(
                    ErrorKind::SelfClosingWithContent,
                    format!("illegal nesting: '{}' is self-closing and can't have content", element.tag),
                    span,
                )
                .with_help("drop the '/' or move the content out of the element"));
            }
            return Ok(format!("<{}{} />", element.tag, attributes));
        }

        Ok(format!("<{tag}{}>{}</{tag}>", attributes, content, tag = element.tag))
    }

    fn render_freeform(&self, freeform: &Freeform, span: Span) -> Result<Option<String>> {
        let kind = FreeformKind::classify(&freeform.text);
        if !kind.renders_children() {
            return kind.render(None, self.config, span);
        }

        let block = match &freeform.content {
            Content::Empty => None,
            Content::Inline(text) => Some(text.clone()),
            Content::Nested(lines) => self.render_block(lines)?,
            Content::Raw(lines) => Some(lines.join("\n")),
        };
        kind.render(block.as_deref(), self.config, span)
    }
}

impl Generator for JspGenerator<'_> {
    fn generate(&self, document: &Document) -> Result<String> {
        let rendered = self.render_lines(&document.lines)?;
        debug!(lines = rendered.len(), format = %self.config.format, "rendered document");
        Ok(rendered.join("\n"))
    }
}

/// Indent every non-empty line by two spaces
/// Prefix every line, blank ones included, with two spaces.
fn indent(text: &str) -> String {
    format!("  {}", text.replace('\n', "\n  "))
}
