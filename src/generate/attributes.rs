use crate::ast::{AttributeMap, AttributeValue, Span};
use crate::config::Format;
use crate::error::{CompileError, ErrorKind, Result};

/// Final attribute list of one element.
pub type MergedAttributes = Vec<(String, AttributeValue)>;

/// Combine the attribute hash with shorthand `#id` and `.class` tokens.
///
/// The hash `class` goes in front of the shorthand classes and the hash `id`
/// after the shorthand ids. Output order is `class`, then the remaining hash
/// attributes in insertion order, then `id`. Only the last two ids survive,
/// joined with `_`. Null values are dropped, except on `id` and `class`
/// where they are an error.
pub fn merge_attributes(
    hash: &AttributeMap,
    shorthand_ids: &[String],
    shorthand_classes: &[String],
    span: Span,
) -> Result<MergedAttributes> {
    let mut ids: Vec<String> = shorthand_ids.to_vec();
    let mut classes: Vec<String> = shorthand_classes.to_vec();

    if let Some(value) = hash.get("id") {
        ids.push(required_text("id", value, span)?);
    }
    if let Some(value) = hash.get("class") {
        classes.insert(0, required_text("class", value, span)?);
    }

    let mut merged = MergedAttributes::new();
    if !classes.is_empty() {
        merged.push(("class".to_string(), AttributeValue::Literal(classes.join(" "))));
    }
    for (name, value) in hash.iter() {
        if name == "id" || name == "class" || *value == AttributeValue::Null {
            continue;
        }
        merged.push((name.to_string(), value.clone()));
    }
    if !ids.is_empty() {
        let last_two = &ids[ids.len().saturating_sub(2)..];
        merged.push(("id".to_string(), AttributeValue::Literal(last_two.join("_"))));
    }

    Ok(merged)
}

fn required_text(name: &str, value: &AttributeValue, span: Span) -> Result<String> {
    value.text().ok_or_else(|| {
        CompileError::new(ErrorKind::NullAttribute, format!("the '{}' attribute is null", name), span)
            .with_help(format!("remove the '{}' entry or give it a value", name))
    })
}

/// Render attributes as ` name='value'` pairs. Values are single-quoted and
/// never escaped. `true` is written bare in HTML formats and as
/// `name='name'` in XHTML; `false` is left out.
pub fn format_attributes(attributes: &[(String, AttributeValue)], format: Format) -> String {
    let mut out = String::new();
    for (name, value) in attributes {
        match value {
            AttributeValue::Boolean(true) if format.is_html() => {
                out.push(' ');
                out.push_str(name);
            }
            AttributeValue::Boolean(true) => {
                out.push_str(&format!(" {}='{}'", name, name));
            }
            AttributeValue::Boolean(false) | AttributeValue::Null => {}
            AttributeValue::Literal(_) | AttributeValue::Expression(_) => {
                if let Some(text) = value.text() {
                    out.push_str(&format!(" {}='{}'", name, text));
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(text: &str) -> AttributeValue {
        AttributeValue::Literal(text.to_string())
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn names(merged: &MergedAttributes) -> Vec<&str> {
        merged.iter().map(|(name, _)| name.as_str()).collect()
    }

    #[test]
    fn test_class_first_id_last() {
        let mut hash = AttributeMap::new();
        hash.insert("id", lit("h"));
        hash.insert("title", lit("t"));
        hash.insert("class", lit("hc"));
        let merged = merge_attributes(&hash, &strings(&["a"]), &strings(&["x", "y"]), Span::default()).unwrap();
        assert_eq!(names(&merged), vec!["class", "title", "id"]);
        assert_eq!(merged[0].1, lit("hc x y"));
        assert_eq!(merged[2].1, lit("a_h"));
    }

    #[test]
    fn test_only_last_two_ids() {
        let merged = merge_attributes(&AttributeMap::new(), &strings(&["a", "b", "c"]), &[], Span::default()).unwrap();
        assert_eq!(merged, vec![("id".to_string(), lit("b_c"))]);
    }

    #[test]
    fn test_expression_id() {
        let mut hash = AttributeMap::new();
        hash.insert("id", AttributeValue::Expression("item.id".into()));
        let merged = merge_attributes(&hash, &strings(&["row"]), &[], Span::default()).unwrap();
        assert_eq!(merged[0].1, lit("row_<%= item.id %>"));
    }

    #[test]
    fn test_null_entries() {
        let mut hash = AttributeMap::new();
        hash.insert("a", AttributeValue::Null);
        let merged = merge_attributes(&hash, &[], &[], Span::default()).unwrap();
        assert!(merged.is_empty());

        let mut hash = AttributeMap::new();
        hash.insert("class", AttributeValue::Null);
        let err = merge_attributes(&hash, &[], &strings(&["x"]), Span::default()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NullAttribute);

        let mut hash = AttributeMap::new();
        hash.insert("id", AttributeValue::Null);
        let err = merge_attributes(&hash, &[], &[], Span::default()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NullAttribute);
    }

    #[test]
    fn test_format_booleans() {
        let attributes = vec![
            ("foo".to_string(), lit("bar")),
            ("bar".to_string(), AttributeValue::Boolean(true)),
            ("baz".to_string(), AttributeValue::Boolean(false)),
        ];
        assert_eq!(format_attributes(&attributes, Format::Html4), " foo='bar' bar");
        assert_eq!(format_attributes(&attributes, Format::Html5), " foo='bar' bar");
        assert_eq!(format_attributes(&attributes, Format::Xhtml), " foo='bar' bar='bar'");
    }

    #[test]
    fn test_values_are_not_escaped() {
        let attributes = vec![("a".to_string(), AttributeValue::Expression("foo(\"'<>&\")".into()))];
        assert_eq!(format_attributes(&attributes, Format::Xhtml), " a='<%= foo(\"'<>&\") %>'");
    }
}
