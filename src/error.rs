use crate::parser::scanner::Span;
use thiserror::Error;

/// Kind of compile error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InconsistentIndentation,
    IllegalTag,
    SelfClosingWithContent,
    EmptyExpression,
    NestedContent,
    IllegalNesting,
    UndefinedFilter,
    NullAttribute,
    LiteralFormat,
    UnbalancedHash,
    InvalidAttributeHash,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InconsistentIndentation => "Inconsistent indentation",
            ErrorKind::IllegalTag => "Illegal tag",
            ErrorKind::SelfClosingWithContent => "Self-closing tag with content",
            ErrorKind::EmptyExpression => "Empty expression",
            ErrorKind::NestedContent => "Illegal nested content",
            ErrorKind::IllegalNesting => "Illegal nesting",
            ErrorKind::UndefinedFilter => "Undefined filter",
            ErrorKind::NullAttribute => "Null attribute",
            ErrorKind::LiteralFormat => "Malformed literal",
            ErrorKind::UnbalancedHash => "Unbalanced attribute hash",
            ErrorKind::InvalidAttributeHash => "Invalid attribute hash",
        }
    }

    /// Stable identifier, used by the golden error files and the JSON report.
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::InconsistentIndentation => "InconsistentIndentation",
            ErrorKind::IllegalTag => "IllegalTag",
            ErrorKind::SelfClosingWithContent => "SelfClosingWithContent",
            ErrorKind::EmptyExpression => "EmptyExpression",
            ErrorKind::NestedContent => "NestedContent",
            ErrorKind::IllegalNesting => "IllegalNesting",
            ErrorKind::UndefinedFilter => "UndefinedFilter",
            ErrorKind::NullAttribute => "NullAttribute",
            ErrorKind::LiteralFormat => "LiteralFormat",
            ErrorKind::UnbalancedHash => "UnbalancedHash",
            ErrorKind::InvalidAttributeHash => "InvalidAttributeHash",
        }
    }
}

/// Error raised while scanning or rendering a document.
///
/// Every check fails fast at the first violation in document order, so a
/// compile either produces the whole output or exactly one of these.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}: {}", .kind.as_str(), .message)]
pub struct CompileError {
    pub kind: ErrorKind,
    pub message: String,
    pub span: Span,
    pub help: Option<String>,
}

pub type Result<T> = std::result::Result<T, CompileError>;

impl CompileError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            message: message.into(),
            span,
            help: None,
        }
    }

    /// Add help text
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Replace the span, keeping everything else.
    ///
    /// Used when an error raised against a sub-slice (an attribute hash, a
    /// literal) has to be reported against the document.
    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Render the error with source context
    pub fn render(&self, source: &str, filename: &str) -> String {
        self.render_inner(source, filename, false)
    }

    /// Render the error with ANSI color codes
    pub fn render_color(&self, source: &str, filename: &str) -> String {
        self.render_inner(source, filename, true)
    }

    fn render_inner(&self, source: &str, filename: &str, color: bool) -> String {
        let red = if color { "\x1b[1;31m" } else { "" };
        let dim = if color { "\x1b[2m" } else { "" };
        let cyan = if color { "\x1b[1;36m" } else { "" };
        let reset = if color { "\x1b[0m" } else { "" };

        let mut output = String::new();
        output.push('\n');

        let line = self.span.start.line + 1;
        let col = self.span.start.col + 1;
        output.push_str(&format!(" {}file:{} {}:{}:{}\n", dim, reset, filename, line, col));
        output.push_str(&format!(
            "{}error:{} {}: {}\n",
            red,
            reset,
            self.kind.as_str(),
            self.message
        ));

        if let Some(source_line) = source.lines().nth(self.span.start.line) {
            let width = format!("{}", line).len().max(2);
            output.push_str(&format!("{}{:>width$} |{}\n", dim, "", reset, width = width));
            output.push_str(&format!(
                "{}{:>width$} |{} {}\n",
                dim,
                line,
                reset,
                source_line,
                width = width
            ));

            let underline_start = self.span.start.col;
            let underline_len = if self.span.end.line == self.span.start.line {
                self.span.end.col.saturating_sub(self.span.start.col).max(1)
            } else {
                source_line
                    .chars()
                    .count()
                    .saturating_sub(underline_start)
                    .max(1)
            };
            output.push_str(&format!(
                "{}{:>width$} |{} {}{}{}{}\n",
                dim,
                "",
                reset,
                " ".repeat(underline_start),
                red,
                "^".repeat(underline_len),
                reset,
                width = width
            ));
        }

        if let Some(ref help) = self.help {
            output.push('\n');
            for (i, help_line) in help.lines().enumerate() {
                if i == 0 {
                    output.push_str(&format!(" {}help:{} {}\n", cyan, reset, help_line));
                } else {
                    output.push_str(&format!("       {}\n", help_line));
                }
            }
        }

        output.push('\n');
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::scanner::Position;

    fn span_on(line: usize, start: usize, end: usize) -> Span {
        Span {
            start: Position { byte: 0, line, col: start },
            end: Position { byte: 0, line, col: end },
        }
    }

    #[test]
    fn test_display_includes_kind_and_message() {
        let err = CompileError::new(ErrorKind::UndefinedFilter, "filter 'foo' is not defined", span_on(0, 0, 4));
        assert_eq!(err.to_string(), "Undefined filter: filter 'foo' is not defined");
    }

    #[test]
    fn test_render_points_at_source() {
        let source = "%p\n  %q{:a => }\n";
        let err = CompileError::new(ErrorKind::InvalidAttributeHash, "expected a value", span_on(1, 4, 13))
            .with_help("write a value after '=>'");
        let rendered = err.render(source, "page.haml");

        assert!(rendered.contains(" file: page.haml:2:5\n"));
        assert!(rendered.contains("error: Invalid attribute hash: expected a value\n"));
        assert!(rendered.contains(" 2 |   %q{:a => }\n"));
        assert!(rendered.contains("\n   |     ^^^^^^^^^\n"));
        assert!(rendered.contains(" help: write a value after '=>'\n"));
    }

    #[test]
    fn test_render_color_wraps_labels() {
        let err = CompileError::new(ErrorKind::IllegalTag, "bad", span_on(0, 0, 1));
        let rendered = err.render_color("%", "x.haml");
        assert!(rendered.contains("\x1b[1;31merror:\x1b[0m"));
    }
}
