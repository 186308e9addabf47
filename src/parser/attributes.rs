//! Attribute hash grammar: `{:name => value, "other" => value}`.
//!
//! The hash text is tokenized with logos and parsed by recursive descent over
//! the token stream. Values that are not literals are host-language
//! expressions; they are kept as the verbatim source slice between the first
//! and last token of the value, so nested braces, parens, strings and commas
//! inside them never end the value early.

use std::ops::Range;

use logos::Logos;

use super::literal::{decode_number, decode_string};
use super::scanner::{Position, Span};
use crate::ast::{AttributeMap, AttributeValue};
use crate::error::{CompileError, ErrorKind, Result};

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
enum HashToken {
    #[token("{")]
    BraceOpen,
    #[token("}")]
    BraceClose,
    #[token("(")]
    ParenOpen,
    #[token(")")]
    ParenClose,
    #[token("[")]
    BracketOpen,
    #[token("]")]
    BracketClose,
    #[token(",")]
    Comma,
    #[token("=>")]
    Arrow,
    #[token("=")]
    Equals,
    #[token(":")]
    Colon,
    #[token("-")]
    Minus,
    #[regex(r#""([^"\\]|\\.)*""#)]
    DoubleQuoted,
    #[regex(r"'([^'\\]|\\.)*'")]
    SingleQuoted,
    #[regex(r":[A-Za-z_][A-Za-z0-9_\-]*")]
    Symbol,
    #[regex(r"[0-9][0-9A-Za-z_]*(\.[0-9A-Za-z_]*)?([eE][+-][0-9][0-9A-Za-z_]*)?")]
    #[regex(r"\.[0-9][0-9A-Za-z_]*([eE][+-][0-9][0-9A-Za-z_]*)?")]
    Number,
    #[regex(r"[A-Za-z_$][A-Za-z0-9_$]*")]
    Ident,
    #[regex(r#"[^ \t\r\n\fA-Za-z0-9_${}()\[\],=:\-'"]"#)]
    Other,
}

type Spanned = (HashToken, Range<usize>);

/// Parse one attribute hash into an ordered attribute map.
///
/// Empty or whitespace-only input yields an empty map.
pub fn parse_attribute_hash(text: &str) -> Result<AttributeMap> {
    if text.trim().is_empty() {
        return Ok(AttributeMap::new());
    }
    let tokens = tokenize(text)?;
    let mut parser = HashParser::new(text, &tokens);
    let map = parser.parse_hash()?;
    if let Some((_, range)) = parser.peek() {
        return Err(parser.error(
            ErrorKind::InvalidAttributeHash,
            "unexpected text after the attribute hash",
            range.clone(),
        ));
    }
    Ok(map)
}

/// Byte length of the balanced `{ ... }` at the start of `text`.
///
/// Only the hash itself is tokenized, so whatever follows the closing brace
/// (inline content, later lines) is never inspected.
pub fn hash_extent(text: &str) -> Result<usize> {
    let mut depth = 0usize;
    for (token, range) in HashToken::lexer(text).spanned() {
        match token {
            Ok(HashToken::BraceOpen) => depth += 1,
            Ok(HashToken::BraceClose) => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Ok(range.end);
                }
            }
            Ok(_) => {}
            Err(()) => return Err(unterminated_string(text, range)),
        }
        if depth == 0 {
            return Err(error_at(
                text,
                ErrorKind::InvalidAttributeHash,
                "an attribute hash must start with '{'",
                range,
            ));
        }
    }
    Err(error_at(
        text,
        ErrorKind::UnbalancedHash,
        "the attribute hash is never closed",
        0..text.len(),
    )
    .with_help("close the hash with '}'"))
}

fn tokenize(text: &str) -> Result<Vec<Spanned>> {
    HashToken::lexer(text)
        .spanned()
        .map(|(token, range)| match token {
            Ok(token) => Ok((token, range)),
            Err(()) => Err(unterminated_string(text, range)),
        })
        .collect()
}

fn unterminated_string(text: &str, range: Range<usize>) -> CompileError {
    error_at(
        text,
        ErrorKind::UnbalancedHash,
        "unterminated string in attribute hash",
        range,
    )
}

fn error_at(text: &str, kind: ErrorKind, message: impl Into<String>, range: Range<usize>) -> CompileError {
    let span = Span {
        start: Position::at(text, range.start),
        end: Position::at(text, range.end),
    };
    CompileError::new(kind, message, span)
}

struct HashParser<'a> {
    source: &'a str,
    tokens: &'a [Spanned],
    pos: usize,
    /// Inside a nested hash, flattened names chain from their own key
    /// instead of taking the `data-` prefix.
    nested: bool,
}

impl<'a> HashParser<'a> {
    fn new(source: &'a str, tokens: &'a [Spanned]) -> Self {
        Self {
            source,
            tokens,
            pos: 0,
            nested: false,
        }
    }

    fn peek(&self) -> Option<&'a Spanned> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<HashToken> {
        self.peek().map(|(token, _)| *token)
    }

    fn advance(&mut self) -> Option<&'a Spanned> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn slice(&self, range: &Range<usize>) -> &'a str {
        &self.source[range.clone()]
    }

    /// Range just past the last token, for errors at end of input.
    fn end_range(&self) -> Range<usize> {
        let end = self.tokens.last().map(|(_, range)| range.end).unwrap_or(0);
        end..end
    }

    fn error(&self, kind: ErrorKind, message: impl Into<String>, range: Range<usize>) -> CompileError {
        error_at(self.source, kind, message, range)
    }

    fn parse_hash(&mut self) -> Result<AttributeMap> {
        match self.advance() {
            Some((HashToken::BraceOpen, _)) => {}
            Some((_, range)) => {
                return Err(self.error(
                    ErrorKind::InvalidAttributeHash,
                    "an attribute hash must start with '{'",
                    range.clone(),
                ));
            }
            None => {
                return Err(self.error(ErrorKind::UnbalancedHash, "empty attribute hash", self.end_range()));
            }
        }

        let mut map = AttributeMap::new();
        loop {
            match self.peek_kind() {
                Some(HashToken::BraceClose) => {
                    self.advance();
                    return Ok(map);
                }
                None => {
                    return Err(self
                        .error(ErrorKind::UnbalancedHash, "the attribute hash is never closed", self.end_range())
                        .with_help("close the hash with '}'"));
                }
                Some(_) => {}
            }

            let name = self.parse_key()?;
            let value = self.parse_value()?;
            match value {
                Value::Single(value) => map.insert(name, value),
                Value::Nested(inner) => {
                    let prefix = if self.nested { name.as_str() } else { "data" };
                    for (inner_name, inner_value) in inner {
                        map.insert_flattened(format!("{}-{}", prefix, inner_name), inner_value);
                    }
                }
            }

            match self.peek() {
                Some((HashToken::Comma, _)) => {
                    self.advance();
                }
                Some((HashToken::BraceClose, _)) | None => {}
                Some((_, range)) => {
                    return Err(self.error(
                        ErrorKind::InvalidAttributeHash,
                        "expected ',' or '}' after an attribute value",
                        range.clone(),
                    ));
                }
            }
        }
    }

    /// `:name`, `:"name"`, `"name"`, `'name'`, `1`, or `name:` followed by the
    /// `=>` separator where it applies.
    fn parse_key(&mut self) -> Result<String> {
        let Some((token, range)) = self.advance() else {
            return Err(self.error(ErrorKind::UnbalancedHash, "the attribute hash is never closed", self.end_range()));
        };

        let name = match token {
            HashToken::Symbol => self.slice(range)[1..].to_string(),
            HashToken::Colon => match self.advance() {
                Some((HashToken::DoubleQuoted | HashToken::SingleQuoted, quoted)) => self.decode_quoted(quoted)?,
                _ => {
                    return Err(self.error(ErrorKind::InvalidAttributeHash, "expected a symbol name after ':'", range.clone()));
                }
            },
            HashToken::DoubleQuoted | HashToken::SingleQuoted => self.decode_quoted(range)?,
            HashToken::Number => self.slice(range).to_string(),
            HashToken::Ident if self.peek_kind() == Some(HashToken::Colon) => {
                self.advance();
                return Ok(self.slice(range).to_string());
            }
            _ => {
                return Err(self
                    .error(ErrorKind::InvalidAttributeHash, "expected an attribute name", range.clone())
                    .with_help("attribute names are written as :name, \"name\" or name:"));
            }
        };

        match self.advance() {
            Some((HashToken::Arrow, _)) => Ok(name),
            Some((_, next)) => Err(self.error(ErrorKind::InvalidAttributeHash, format!("expected '=>' after '{}'", name), next.clone())),
            None => Err(self.error(ErrorKind::UnbalancedHash, "the attribute hash is never closed", self.end_range())),
        }
    }

    fn decode_quoted(&self, range: &Range<usize>) -> Result<String> {
        decode_string(self.slice(range))
            .map_err(|err| self.error(ErrorKind::LiteralFormat, err.to_string(), range.clone()))
    }

    /// Collect the tokens of one value, stopping at a top-level ',' or the
    /// '}' closing the enclosing hash.
    fn parse_value(&mut self) -> Result<Value> {
        let start = self.pos;
        let mut open: Vec<(HashToken, Range<usize>)> = Vec::new();

        while let Some((token, range)) = self.peek() {
            match token {
                HashToken::Comma if open.is_empty() => break,
                HashToken::BraceClose if open.is_empty() => break,
                HashToken::BraceOpen | HashToken::ParenOpen | HashToken::BracketOpen => {
                    open.push((*token, range.clone()));
                }
                HashToken::BraceClose | HashToken::ParenClose | HashToken::BracketClose => {
                    let expected = match token {
                        HashToken::BraceClose => HashToken::BraceOpen,
                        HashToken::ParenClose => HashToken::ParenOpen,
                        _ => HashToken::BracketOpen,
                    };
                    match open.pop() {
                        Some((opener, _)) if opener == expected => {}
                        _ => {
                            return Err(self.error(
                                ErrorKind::UnbalancedHash,
                                format!("unmatched '{}' in attribute value", self.slice(range)),
                                range.clone(),
                            ));
                        }
                    }
                }
                _ => {}
            }
            self.pos += 1;
        }

        if let Some((_, range)) = open.last() {
            return Err(self
                .error(
                    ErrorKind::UnbalancedHash,
                    format!("'{}' is never closed", self.slice(range)),
                    range.clone(),
                )
                .with_help("balance the braces, brackets and parentheses in the attribute value"));
        }

        let value_tokens = &self.tokens[start..self.pos];
        if value_tokens.is_empty() {
            let range = self.peek().map(|(_, range)| range.clone()).unwrap_or_else(|| self.end_range());
            return Err(self.error(ErrorKind::InvalidAttributeHash, "expected a value after '=>'", range));
        }
        self.classify(value_tokens)
    }

    fn classify(&self, tokens: &'a [Spanned]) -> Result<Value> {
        let (first, first_range) = &tokens[0];
        let (_, last_range) = &tokens[tokens.len() - 1];

        if tokens.len() == 1 {
            let text = self.slice(first_range);
            return Ok(Value::Single(match first {
                HashToken::DoubleQuoted | HashToken::SingleQuoted => AttributeValue::Literal(self.decode_quoted(first_range)?),
                HashToken::Number => AttributeValue::Literal(self.decode_numeral(text, first_range.clone())?),
                HashToken::Ident if text == "null" => AttributeValue::Null,
                HashToken::Ident if text == "true" => AttributeValue::Boolean(true),
                HashToken::Ident if text == "false" => AttributeValue::Boolean(false),
                _ => AttributeValue::Expression(text.to_string()),
            }));
        }

        if let [(HashToken::Minus, minus), (HashToken::Number, number)] = tokens {
            if minus.end == number.start {
                let text = self.slice(&(minus.start..number.end));
                return Ok(Value::Single(AttributeValue::Literal(
                    self.decode_numeral(text, minus.start..number.end)?,
                )));
            }
        }

        if *first == HashToken::BraceOpen && self.closes_at_end(tokens) {
            let mut nested = HashParser::new(self.source, tokens);
            nested.nested = true;
            return Ok(Value::Nested(nested.parse_hash()?));
        }

        let code = self.slice(&(first_range.start..last_range.end));
        Ok(Value::Single(AttributeValue::Expression(code.to_string())))
    }

    fn decode_numeral(&self, text: &str, range: Range<usize>) -> Result<String> {
        decode_number(text).map_err(|err| self.error(ErrorKind::LiteralFormat, err.to_string(), range))
    }

    /// Whether the brace opening `tokens` is matched by its last token.
    fn closes_at_end(&self, tokens: &[Spanned]) -> bool {
        let mut depth = 0usize;
        for (index, (token, _)) in tokens.iter().enumerate() {
            match token {
                HashToken::BraceOpen => depth += 1,
                HashToken::BraceClose => {
                    depth -= 1;
                    if depth == 0 {
                        return index == tokens.len() - 1;
                    }
                }
                _ => {}
            }
        }
        false
    }
}

enum Value {
    Single(AttributeValue),
    Nested(AttributeMap),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(text: &str) -> AttributeValue {
        AttributeValue::Literal(text.to_string())
    }

    fn expr(code: &str) -> AttributeValue {
        AttributeValue::Expression(code.to_string())
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_attribute_hash("").unwrap().is_empty());
        assert!(parse_attribute_hash("  \n ").unwrap().is_empty());
        assert!(parse_attribute_hash("{}").unwrap().is_empty());
    }

    #[test]
    fn test_insertion_order() {
        let map = parse_attribute_hash(r#"{:a => "x", :b => 1}"#).unwrap();
        assert_eq!(map.names(), vec!["a", "b"]);
        assert_eq!(map.get("a"), Some(&lit("x")));
        assert_eq!(map.get("b"), Some(&lit("1")));
    }

    #[test]
    fn test_key_forms() {
        let map = parse_attribute_hash(r#"{1 => 42, "2" => 'b', :"http-equiv" => 'c', title: 'd', :data-x => 'e'}"#).unwrap();
        assert_eq!(map.names(), vec!["1", "2", "http-equiv", "title", "data-x"]);
    }

    #[test]
    fn test_trailing_comma() {
        let map = parse_attribute_hash("{:a => 1,}").unwrap();
        assert_eq!(map.names(), vec!["a"]);
    }

    #[test]
    fn test_literal_keywords() {
        let map = parse_attribute_hash("{:a => null, :b => true, :c => false}").unwrap();
        assert_eq!(map.get("a"), Some(&AttributeValue::Null));
        assert_eq!(map.get("b"), Some(&AttributeValue::Boolean(true)));
        assert_eq!(map.get("c"), Some(&AttributeValue::Boolean(false)));
    }

    #[test]
    fn test_negative_number() {
        let map = parse_attribute_hash("{:a => -0x10, :b => - 1}").unwrap();
        assert_eq!(map.get("a"), Some(&lit("-16")));
        assert_eq!(map.get("b"), Some(&expr("- 1")));
    }

    #[test]
    fn test_expression_keeps_source_verbatim() {
        let map = parse_attribute_hash("{:a => foo( bar , [1, 2] ), :b => x ? \"}\" : '{'}").unwrap();
        assert_eq!(map.get("a"), Some(&expr("foo( bar , [1, 2] )")));
        assert_eq!(map.get("b"), Some(&expr("x ? \"}\" : '{'")));
    }

    #[test]
    fn test_nested_flattening_is_recursive() {
        let map = parse_attribute_hash("{:data => {:user => {:id => 7}, :role => 'admin'}}").unwrap();
        assert_eq!(map.names(), vec!["data-user-id", "data-role"]);
        assert_eq!(map.get("data-user-id"), Some(&lit("7")));
    }

    #[test]
    fn test_nested_hash_under_any_key_becomes_data_attributes() {
        let map = parse_attribute_hash("{:foo => {:bar => 'x'}}").unwrap();
        assert_eq!(map.names(), vec!["data-bar"]);

        let map = parse_attribute_hash("{:opts => {:user => {:id => 7}}}").unwrap();
        assert_eq!(map.names(), vec!["data-user-id"]);
    }

    #[test]
    fn test_exponent_and_leading_dot_floats() {
        let map = parse_attribute_hash("{:a => 1e-5, :b => .5, :c => 2.5E+2d, :d => -.25f}").unwrap();
        assert_eq!(map.get("a"), Some(&lit("0.00001")));
        assert_eq!(map.get("b"), Some(&lit("0.5")));
        assert_eq!(map.get("c"), Some(&lit("250.0")));
        assert_eq!(map.get("d"), Some(&lit("-0.25")));
    }

    #[test]
    fn test_malformed_numeral() {
        let err = parse_attribute_hash("{:a => 09}").unwrap_err();
        assert_eq!(err.kind, ErrorKind::LiteralFormat);
        assert_eq!(err.span.start.col, 7);
    }

    #[test]
    fn test_unbalanced() {
        assert_eq!(parse_attribute_hash("{:a => 'x'").unwrap_err().kind, ErrorKind::UnbalancedHash);
        assert_eq!(parse_attribute_hash("{:a => \"x}").unwrap_err().kind, ErrorKind::UnbalancedHash);
        assert_eq!(parse_attribute_hash("{:a => foo(}").unwrap_err().kind, ErrorKind::UnbalancedHash);
        assert_eq!(parse_attribute_hash("{:a => foo)}").unwrap_err().kind, ErrorKind::UnbalancedHash);
    }

    #[test]
    fn test_invalid_structure() {
        assert_eq!(parse_attribute_hash("{:a 1}").unwrap_err().kind, ErrorKind::InvalidAttributeHash);
        assert_eq!(parse_attribute_hash("{:a => }").unwrap_err().kind, ErrorKind::InvalidAttributeHash);
        assert_eq!(parse_attribute_hash("{a => 1}").unwrap_err().kind, ErrorKind::InvalidAttributeHash);
        assert_eq!(parse_attribute_hash("{:a => 1} x").unwrap_err().kind, ErrorKind::InvalidAttributeHash);
    }

    #[test]
    fn test_hash_extent() {
        assert_eq!(hash_extent("{:a => 1} text").unwrap(), 9);
        assert_eq!(hash_extent("{:a => '}'}/").unwrap(), 11);
        assert_eq!(hash_extent("{:a => {:b => 1}}\n%p").unwrap(), 17);
        assert_eq!(hash_extent("{:a => foo(\n  1)}").unwrap(), 17);
    }

    #[test]
    fn test_hash_extent_unclosed() {
        assert_eq!(hash_extent("{:a => 1\n%p").unwrap_err().kind, ErrorKind::UnbalancedHash);
        assert_eq!(hash_extent("{:a => 'x}").unwrap_err().kind, ErrorKind::UnbalancedHash);
    }
}
