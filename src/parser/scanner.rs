use tracing::{debug, trace};

use super::attributes::{hash_extent, parse_attribute_hash};
use super::indentation::{IndentationError, IndentationValidator};
use crate::ast::{AttributeMap, Content, Element, Freeform, Line, LineKind};
use crate::error::{CompileError, ErrorKind, Result};

/// Position in source code (byte offset only; line and column for reporting)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// Byte offset in source
    pub byte: usize,
    /// Line number (0-indexed)
    pub line: usize,
    /// Column number (0-indexed, in characters)
    pub col: usize,
}

impl Position {
    /// Position of `byte` within `source`, clamped to its length and moved
    /// back onto a character boundary.
    pub fn at(source: &str, byte: usize) -> Self {
        let byte = floor_boundary(source, byte);
        let before = &source[..byte];
        let line = before.matches('\n').count();
        let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        Self {
            byte,
            line,
            col: before[line_start..].chars().count(),
        }
    }
}

/// Span in source code (a range from start position to end position)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

fn floor_boundary(source: &str, byte: usize) -> usize {
    let mut byte = byte.min(source.len());
    while !source.is_char_boundary(byte) {
        byte -= 1;
    }
    byte
}

/// Characters allowed in a tag name after the leading `%`
fn is_tag_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == ':'
}

/// Characters allowed in a shorthand `#id` or `.class`
fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Line scanner: turns source text into a flat list of lines, each carrying
/// its depth. Nesting is left to the tree builder.
///
/// Owns the indentation state for exactly one document.
pub struct Scanner<'a> {
    source: &'a str,
    line_starts: Vec<usize>,
    validator: IndentationValidator,
    offset: usize,
    lines: Vec<Line>,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(source.match_indices('\n').map(|(i, _)| i + 1));
        Self {
            source,
            line_starts,
            validator: IndentationValidator::new(),
            offset: 0,
            lines: Vec::new(),
        }
    }

    /// Scan the entire source
    pub fn scan(mut self) -> Result<Vec<Line>> {
        while self.offset < self.source.len() {
            self.scan_line()?;
        }
        debug!(lines = self.lines.len(), unit = ?self.validator.unit_size(), "scanned document");
        Ok(self.lines)
    }

    fn position(&self, byte: usize) -> Position {
        let byte = floor_boundary(self.source, byte);
        let line = self.line_starts.partition_point(|start| *start <= byte) - 1;
        let line_start = self.line_starts[line];
        Position {
            byte,
            line,
            col: self.source[line_start..byte].chars().count(),
        }
    }

    /// Byte offset just past the character starting at `byte`.
    fn char_end(&self, byte: usize) -> usize {
        byte + self.source[byte..].chars().next().map_or(1, char::len_utf8)
    }

    fn span(&self, start: usize, end: usize) -> Span {
        Span {
            start: self.position(start),
            end: self.position(end),
        }
    }

    /// End of the line content starting at `offset` (excluding any `\r\n`),
    /// and the start of the next line.
    fn line_bounds(&self, offset: usize) -> (usize, usize) {
        match self.source[offset..].find('\n') {
            Some(i) => {
                let newline = offset + i;
                let end = if self.source[..newline].ends_with('\r') && newline > offset {
                    newline - 1
                } else {
                    newline
                };
                (end, newline + 1)
            }
            None => {
                let end = self.source.len();
                let end = if self.source[offset..end].ends_with('\r') { end - 1 } else { end };
                (end, self.source.len())
            }
        }
    }

    fn indentation_error(&self, err: IndentationError, start: usize, end: usize) -> CompileError {
        let unit = self.validator.unit_size().unwrap_or(0);
        let message = err.message(unit, self.validator.indent_with_tabs());
        CompileError::new(ErrorKind::InconsistentIndentation, message, self.span(start, end.max(self.char_end(start))))
            .with_help("indent every nested line by exactly one more unit, using the same character as the rest of the document")
    }

    fn scan_line(&mut self) -> Result<()> {
        let source = self.source;
        let start = self.offset;
        let (end, next) = self.line_bounds(start);
        let raw = &source[start..end];

        if raw.trim().is_empty() {
            trace!(line = self.position(start).line, "blank");
            self.lines.push(Line {
                depth: 0,
                kind: LineKind::Blank,
                span: self.span(start, end),
            });
            self.offset = next;
            return Ok(());
        }

        let indent_len = raw.len() - raw.trim_start_matches([' ', '\t']).len();
        let indentation = &raw[..indent_len];
        let width = self
            .validator
            .observe(indentation, false)
            .map_err(|err| self.indentation_error(err, start, start + indent_len))?;
        let depth = self.validator.depth_of(width);
        let body_start = start + indent_len;
        let body = &raw[indent_len..];

        let mut chars = body.chars();
        let first = chars.next();
        let second = chars.next();
        let is_element = match first {
            Some('%') => true,
            Some('#') | Some('.') => second.is_some_and(is_name_char),
            _ => false,
        };

        if is_element {
            let (element, consumed_end) = self.scan_element(body_start)?;
            let (_, after) = self.line_bounds(consumed_end);
            trace!(line = self.position(start).line, depth, tag = %element.tag, "element");
            self.lines.push(Line {
                depth,
                kind: LineKind::Element(element),
                span: self.span(start, consumed_end),
            });
            self.offset = after;
            return Ok(());
        }

        trace!(line = self.position(start).line, depth, "freeform");
        self.offset = next;
        let content = if body.starts_with(':') {
            self.scan_filter_body(indent_len)?
        } else {
            Content::Empty
        };
        self.lines.push(Line {
            depth,
            kind: LineKind::Freeform(Freeform {
                text: body.to_string(),
                content,
            }),
            span: self.span(start, end),
        });
        Ok(())
    }

    /// `%tag#id.class{hash}/ content`, starting at the first character of the
    /// head. Returns the element and the byte offset where the line ends; an
    /// attribute hash may carry the line over several physical lines.
    fn scan_element(&mut self, head_start: usize) -> Result<(Element, usize)> {
        let source = self.source;
        let mut cursor = head_start;

        let tag = if source[cursor..].starts_with('%') {
            cursor += 1;
            let name_len = source[cursor..]
                .find(|c: char| !is_tag_char(c))
                .unwrap_or(source.len() - cursor);
            let name = &source[cursor..cursor + name_len];
            let legal_start = name
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == ':');
            if !legal_start {
                let (line_end, _) = self.line_bounds(head_start);
                return Err(CompileError::new(
                    ErrorKind::IllegalTag,
                    format!("illegal element '{}'", &source[head_start..line_end]),
                    self.span(head_start, (cursor + name_len).max(self.char_end(head_start))),
                )
                .with_help("tag names start with a letter, '_' or ':'"));
            }
            cursor += name_len;
            name.to_string()
        } else {
            "div".to_string()
        };
        let tag_span = self.span(head_start, cursor);

        let mut ids = Vec::new();
        let mut classes = Vec::new();
        while let Some(marker) = source[cursor..].chars().next().filter(|c| *c == '#' || *c == '.') {
            let name_start = cursor + 1;
            let name_len = source[name_start..]
                .find(|c: char| !is_name_char(c))
                .unwrap_or(source.len() - name_start);
            if name_len == 0 {
                return Err(CompileError::new(
                    ErrorKind::IllegalTag,
                    "classes and ids must have values",
                    self.span(cursor, self.char_end(cursor)),
                )
                .with_help(format!("write a name after '{}'", marker)));
            }
            let name = source[name_start..name_start + name_len].to_string();
            if marker == '#' {
                ids.push(name);
            } else {
                classes.push(name);
            }
            cursor = name_start + name_len;
        }

        let mut attributes = AttributeMap::new();
        if source[cursor..].starts_with('{') {
            let base = cursor;
            let extent = hash_extent(&source[base..]).map_err(|err| self.relocate(err, base))?;
            attributes = parse_attribute_hash(&source[base..base + extent]).map_err(|err| self.relocate(err, base))?;
            cursor += extent;
        }

        let mut self_closing = false;
        if source[cursor..].starts_with('/') {
            self_closing = true;
            cursor += 1;
        }

        let (line_end, _) = self.line_bounds(cursor);
        let rest = &source[cursor..line_end];
        let content = if rest.is_empty() {
            Content::Empty
        } else if rest.starts_with('=') {
            Content::Inline(rest.to_string())
        } else if rest.starts_with([' ', '\t']) {
            let text = rest.trim_start();
            if text.is_empty() {
                Content::Empty
            } else {
                Content::Inline(text.to_string())
            }
        } else {
            return Err(CompileError::new(
                ErrorKind::IllegalTag,
                format!("illegal character '{}' after element", rest.chars().next().unwrap_or(' ')),
                self.span(cursor, self.char_end(cursor)),
            )
            .with_help("separate inline content from the element with a space"));
        };

        let element = Element {
            tag,
            tag_span,
            ids,
            classes,
            attributes,
            self_closing,
            content,
        };
        Ok((element, line_end))
    }

    /// Re-anchor an error raised against a slice starting at `base`.
    fn relocate(&self, err: CompileError, base: usize) -> CompileError {
        let span = self.span(base + err.span.start.byte, base + err.span.end.byte);
        err.at(span)
    }

    /// Collect the raw body of a filter opened by a line indented
    /// `filter_width` characters: every following line indented deeper, and
    /// blank lines between them. Excess indentation stays in the body.
    fn scan_filter_body(&mut self, filter_width: usize) -> Result<Content> {
        let mut body = Vec::new();
        let mut pending_blanks = 0;
        let mut resume = self.offset;

        let source = self.source;
        while self.offset < source.len() {
            let start = self.offset;
            let (end, next) = self.line_bounds(start);
            let raw = &source[start..end];

            if raw.trim().is_empty() {
                pending_blanks += 1;
                self.offset = next;
                continue;
            }

            let indent_len = raw.len() - raw.trim_start_matches([' ', '\t']).len();
            if indent_len <= filter_width {
                break;
            }
            let width = self
                .validator
                .observe(&raw[..indent_len], true)
                .map_err(|err| self.indentation_error(err, start, start + indent_len))?;

            body.extend(std::iter::repeat_n(String::new(), pending_blanks));
            pending_blanks = 0;
            body.push(raw[width..].to_string());
            self.offset = next;
            resume = next;
        }

        // Trailing blank lines are not part of the body
        self.offset = resume;
        Ok(if body.is_empty() { Content::Empty } else { Content::Raw(body) })
    }
}

/// Scan source code into flat lines
pub fn scan(source: &str) -> Result<Vec<Line>> {
    Scanner::new(source).scan()
}
