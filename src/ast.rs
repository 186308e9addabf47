use std::sync::Arc;

// Re-export Position and Span from the scanner so the rest of the crate
// uses a single Span type
pub use crate::parser::scanner::{Position, Span};

/// A scanned document: the top-level lines, each owning its children.
#[derive(Debug, Clone)]
pub struct Document {
    pub lines: Vec<Line>,
    pub source: Arc<str>,
}

impl Document {
    pub fn new(lines: Vec<Line>, source: Arc<str>) -> Self {
        Self { lines, source }
    }
}

/// One structural line of the document
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    /// Indentation level, 0 at the document root
    pub depth: usize,
    pub kind: LineKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LineKind {
    Element(Element),
    Freeform(Freeform),
    Blank,
}

/// `%tag#id.class{:attr => value}/ content`
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: String,
    pub tag_span: Span,
    /// Shorthand `#id` tokens in source order
    pub ids: Vec<String>,
    /// Shorthand `.class` tokens in source order
    pub classes: Vec<String>,
    pub attributes: AttributeMap,
    pub self_closing: bool,
    pub content: Content,
}

/// Any line that is not an element. The prefix character is kept so the
/// renderer can classify it.
#[derive(Debug, Clone, PartialEq)]
pub struct Freeform {
    pub text: String,
    pub content: Content,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Content {
    #[default]
    Empty,
    /// Text following the element head on the same line
    Inline(String),
    /// Child lines, one indentation unit deeper
    Nested(Vec<Line>),
    /// Verbatim body of a filter block
    Raw(Vec<String>),
}

impl Content {
    pub fn is_empty(&self) -> bool {
        match self {
            Content::Empty => true,
            Content::Inline(text) => text.is_empty(),
            Content::Nested(lines) => lines.iter().all(|line| line.kind == LineKind::Blank),
            Content::Raw(lines) => lines.is_empty(),
        }
    }
}

/// Value of one attribute from an attribute hash
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// Decoded literal text, emitted as-is
    Literal(String),
    /// Host-language source, emitted inside an expression marker
    Expression(String),
    /// Bare `true`/`false`; rendering depends on the output format
    Boolean(bool),
    /// `null`: never emitted
    Null,
}

impl AttributeValue {
    /// Text as it appears inside the quoted attribute value. `None` for null.
    pub fn text(&self) -> Option<String> {
        match self {
            AttributeValue::Literal(text) => Some(text.clone()),
            AttributeValue::Expression(code) => Some(format!("<%= {} %>", code)),
            AttributeValue::Boolean(value) => Some(value.to_string()),
            AttributeValue::Null => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct AttributeEntry {
    name: String,
    value: AttributeValue,
    /// Written as a flat key rather than produced by flattening a nested hash
    explicit: bool,
}

/// Insertion-ordered attribute mapping.
///
/// Entries written as flat keys always win over entries with the same name
/// produced by flattening a nested hash, whichever comes first.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttributeMap {
    entries: Vec<AttributeEntry>,
}

impl AttributeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a flat `key => value` entry. A repeated key keeps its position
    /// and takes the new value.
    pub fn insert(&mut self, name: impl Into<String>, value: AttributeValue) {
        let name = name.into();
        match self.entries.iter_mut().find(|entry| entry.name == name) {
            Some(entry) => {
                entry.value = value;
                entry.explicit = true;
            }
            None => self.entries.push(AttributeEntry {
                name,
                value,
                explicit: true,
            }),
        }
    }

    /// Insert an entry produced by flattening a nested hash. Ignored when a
    /// flat entry of the same name exists.
    pub fn insert_flattened(&mut self, name: impl Into<String>, value: AttributeValue) {
        let name = name.into();
        match self.entries.iter_mut().find(|entry| entry.name == name) {
            Some(entry) if entry.explicit => {}
            Some(entry) => entry.value = value,
            None => self.entries.push(AttributeEntry {
                name,
                value,
                explicit: false,
            }),
        }
    }

    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| &entry.value)
    }

    pub fn remove(&mut self, name: &str) -> Option<AttributeValue> {
        let index = self.entries.iter().position(|entry| entry.name == name)?;
        Some(self.entries.remove(index).value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.entries
            .iter()
            .map(|entry| (entry.name.as_str(), &entry.value))
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.name.as_str()).collect()
    }
}

impl IntoIterator for AttributeMap {
    type Item = (String, AttributeValue);
    type IntoIter = std::vec::IntoIter<(String, AttributeValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries
            .into_iter()
            .map(|entry| (entry.name, entry.value))
            .collect::<Vec<_>>()
            .into_iter()
    }
}
