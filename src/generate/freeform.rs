use tracing::debug;

use crate::ast::Span;
use crate::config::Config;
use crate::error::{CompileError, ErrorKind, Result};
use crate::html;

/// Keywords whose multi-line scriptlets are rewritten into braced blocks.
const CONTROL_KEYWORDS: &[&str] = &["if", "while", "for"];

/// What a line of free-form text means, decided once from its prefix.
///
/// Every variant borrows the text after its prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreeformKind<'a> {
    /// `!!!` with the variant name after it
    Doctype(&'a str),
    /// `-#`: renders nothing, nested lines included
    SilentComment,
    /// `= code`
    Expression(&'a str),
    /// `- code`
    Scriptlet(&'a str),
    /// `/[if IE] rest`: condition includes the brackets
    ConditionalComment { condition: &'a str, rest: &'a str },
    /// `/ text`
    Comment(&'a str),
    /// `:name`
    Filter(&'a str),
    /// `\text`
    Escaped(&'a str),
    Plain(&'a str),
}

impl<'a> FreeformKind<'a> {
    pub fn classify(text: &'a str) -> Self {
        if let Some(rest) = text.strip_prefix("!!!") {
            return FreeformKind::Doctype(rest);
        }
        if text.starts_with("-#") {
            return FreeformKind::SilentComment;
        }
        if let Some(rest) = text.strip_prefix('=') {
            return FreeformKind::Expression(rest);
        }
        if let Some(rest) = text.strip_prefix('-') {
            return FreeformKind::Scriptlet(rest);
        }
        if let Some(rest) = text.strip_prefix('/') {
            if rest.starts_with("[if") {
                if let Some(close) = rest.find(']') {
                    return FreeformKind::ConditionalComment {
                        condition: &rest[..=close],
                        rest: &rest[close + 1..],
                    };
                }
            }
            return FreeformKind::Comment(rest);
        }
        if let Some(rest) = text.strip_prefix(':') {
            return FreeformKind::Filter(rest);
        }
        if let Some(rest) = text.strip_prefix('\\') {
            return FreeformKind::Escaped(rest);
        }
        FreeformKind::Plain(text)
    }

    /// Whether nested lines are rendered at all
    pub fn renders_children(&self) -> bool {
        !matches!(self, FreeformKind::SilentComment)
    }

    /// Render the line. `block` is the already rendered and indented nested
    /// content, or the raw body for a filter. `None` means no output.
    pub fn render(&self, block: Option<&str>, config: &Config, span: Span) -> Result<Option<String>> {
        let rendered = match *self {
            FreeformKind::Doctype(variant) => {
                if block.is_some() {
                    return Err(CompileError::new(
                        ErrorKind::NestedContent,
                        "illegal nesting: nesting within a header command is illegal",
                        span,
                    ));
                }
                html::doctype(variant)
            }
            FreeformKind::SilentComment => return Ok(None),
            FreeformKind::Expression(code) => expression(code, block, span)?,
            FreeformKind::Scriptlet(code) => scriptlet(code.trim(), block),
            FreeformKind::ConditionalComment { condition, rest } => {
                let mut out = format!("<!--{}>{}", condition, rest);
                if let Some(block) = block {
                    out.push('\n');
                    out.push_str(block);
                    out.push('\n');
                }
                out.push_str("<![endif]-->");
                out
            }
            FreeformKind::Comment(text) => comment(text, block, span)?,
            FreeformKind::Filter(name) => filter(name.trim(), block, config, span)?,
            FreeformKind::Escaped(text) | FreeformKind::Plain(text) => {
                if block.is_some() {
                    return Err(CompileError::new(
                        ErrorKind::IllegalNesting,
                        "illegal nesting: nesting within plain text is illegal",
                        span,
                    )
                    .with_help("plain text can't have nested lines; indent them under an element instead"));
                }
                text.trim_end_matches(' ').to_string()
            }
        };
        Ok(Some(rendered))
    }
}

fn expression(code: &str, block: Option<&str>, span: Span) -> Result<String> {
    let code = match block {
        Some(block) => format!("{}\n{}", code.trim(), block).trim().to_string(),
        None => code.trim().to_string(),
    };
    if code.is_empty() {
        return Err(CompileError::new(
            ErrorKind::EmptyExpression,
            "there's no code to evaluate after '='",
            span,
        ));
    }
    Ok(format!("<%= {} %>", code))
}

fn scriptlet(code: &str, block: Option<&str>) -> String {
    let Some(block) = block else {
        return format!("<% {} %>", code);
    };
    match control_keyword(code) {
        Some(keyword) => {
            let condition = parenthesize(code[keyword.len()..].trim());
            format!("<% {} {} {{ %>\n{}\n<% }} %>", keyword, condition, block)
        }
        None => format!("<% {}\n{} %>", code, block),
    }
}

/// The control keyword `code` starts with, as a whole word
fn control_keyword(code: &str) -> Option<&'static str> {
    CONTROL_KEYWORDS.iter().copied().find(|keyword| {
        code.strip_prefix(*keyword)
            .is_some_and(|rest| !rest.starts_with(|c: char| c.is_alphanumeric() || c == '_' || c == '$'))
    })
}

/// Wrap `condition` in parentheses unless one pair already encloses all of it.
fn parenthesize(condition: &str) -> String {
    if condition.starts_with('(') {
        let mut depth = 0usize;
        for (index, c) in condition.char_indices() {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        if index == condition.len() - 1 {
                            return condition.to_string();
                        }
                        break;
                    }
                }
                _ => {}
            }
        }
    }
    format!("({})", condition)
}

fn comment(text: &str, block: Option<&str>, span: Span) -> Result<String> {
    let text = text.trim();
    match block {
        Some(_) if !text.is_empty() => Err(CompileError::new(
            ErrorKind::NestedContent,
            "illegal nesting: nesting within a comment that has content on the same line is illegal",
            span,
        )
        .with_help("move the comment text into the nested block")),
        Some(block) => Ok(format!("<!--\n{}\n-->", block)),
        None if text.is_empty() => Ok("<!--\n-->".to_string()),
        None => Ok(format!("<!-- {} -->", text)),
    }
}

fn filter(name: &str, body: Option<&str>, config: &Config, span: Span) -> Result<String> {
    let Some(filter) = config.filter(name) else {
        return Err(CompileError::new(
            ErrorKind::UndefinedFilter,
            format!("filter \"{}\" is not defined", name),
            span,
        )
        .with_help("register the filter with Config::with_filter"));
    };
    let body = body.unwrap_or("");
    debug!(filter = name, bytes = body.len(), "running filter");
    Ok(filter.process(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn render(text: &str, block: Option<&str>) -> Result<Option<String>> {
        FreeformKind::classify(text).render(block, &Config::default(), Span::default())
    }

    fn rendered(text: &str, block: Option<&str>) -> String {
        render(text, block).unwrap().unwrap_or_default()
    }

    #[rstest]
    #[case("!!!", FreeformKind::Doctype(""))]
    #[case("!!! 5", FreeformKind::Doctype(" 5"))]
    #[case("-# note", FreeformKind::SilentComment)]
    #[case("= foo", FreeformKind::Expression(" foo"))]
    #[case("- foo()", FreeformKind::Scriptlet(" foo()"))]
    #[case("/[if IE] x", FreeformKind::ConditionalComment { condition: "[if IE]", rest: " x" })]
    #[case("/[if IE", FreeformKind::Comment("[if IE"))]
    #[case("/ note", FreeformKind::Comment(" note"))]
    #[case(":markdown", FreeformKind::Filter("markdown"))]
    #[case("\\= x", FreeformKind::Escaped("= x"))]
    #[case("hello", FreeformKind::Plain("hello"))]
    fn test_classify(#[case] text: &str, #[case] expected: FreeformKind) {
        assert_eq!(FreeformKind::classify(text), expected);
    }

    #[test]
    fn test_expression() {
        assert_eq!(rendered("=  user.name ", None), "<%= user.name %>");
        assert_eq!(rendered("= foo(", Some("  bar)")), "<%= foo(\n  bar) %>");
        assert_eq!(render("=  ", None).unwrap_err().kind, ErrorKind::EmptyExpression);
    }

    #[rstest]
    #[case("- if x > 1", "<% if (x > 1) { %>\n  foo()\n<% } %>")]
    #[case("- if (x > 1)", "<% if (x > 1) { %>\n  foo()\n<% } %>")]
    #[case("- if (a) && (b)", "<% if ((a) && (b)) { %>\n  foo()\n<% } %>")]
    #[case("- while it.hasNext()", "<% while (it.hasNext()) { %>\n  foo()\n<% } %>")]
    #[case("- for (String s : list)", "<% for (String s : list) { %>\n  foo()\n<% } %>")]
    #[case("- format(x)", "<% format(x)\n  foo() %>")]
    fn test_scriptlet_with_block(#[case] text: &str, #[case] expected: &str) {
        assert_eq!(rendered(text, Some("  foo()")), expected);
    }

    #[test]
    fn test_single_line_scriptlet() {
        assert_eq!(rendered("- if (x) { y(); }", None), "<% if (x) { y(); } %>");
        assert_eq!(rendered("-int i = 0;", None), "<% int i = 0; %>");
    }

    #[test]
    fn test_comments() {
        assert_eq!(rendered("/", None), "<!--\n-->");
        assert_eq!(rendered("/   ", None), "<!--\n-->");
        assert_eq!(rendered("/ hello  ", None), "<!-- hello -->");
        assert_eq!(rendered("/", Some("  <p></p>")), "<!--\n  <p></p>\n-->");
        assert_eq!(render("/ x", Some("  y")).unwrap_err().kind, ErrorKind::NestedContent);
    }

    #[test]
    fn test_conditional_comment() {
        assert_eq!(rendered("/[if IE] hi", None), "<!--[if IE]> hi<![endif]-->");
        assert_eq!(
            rendered("/[if lt IE 8]", Some("  <p></p>")),
            "<!--[if lt IE 8]>\n  <p></p>\n<![endif]-->"
        );
    }

    #[test]
    fn test_doctype() {
        assert!(rendered("!!!", None).contains("XHTML 1.0 Transitional"));
        assert_eq!(rendered("!!! 5", None), "<!DOCTYPE html>");
        assert_eq!(render("!!!", Some("  x")).unwrap_err().kind, ErrorKind::NestedContent);
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(rendered("  some text   ", None), "  some text");
        assert_eq!(rendered("\\- not code", None), "- not code");
        assert_eq!(render("text", Some("  more")).unwrap_err().kind, ErrorKind::IllegalNesting);
    }

    #[test]
    fn test_silent_comment() {
        assert_eq!(render("-# hidden", None).unwrap(), None);
        assert!(!FreeformKind::classify("-#").renders_children());
    }

    #[test]
    fn test_filters() {
        let config = Config::new().with_filter("shout", |text: &str| format!("{}!", text.to_uppercase()));
        let kind = FreeformKind::classify(":shout");
        let out = kind.render(Some("a\n  b"), &config, Span::default()).unwrap();
        assert_eq!(out.as_deref(), Some("A\n  B!"));
        assert_eq!(kind.render(None, &config, Span::default()).unwrap().as_deref(), Some("!"));

        let err = FreeformKind::classify(":missing").render(None, &config, Span::default()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UndefinedFilter);
    }
}
