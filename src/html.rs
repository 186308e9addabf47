//! Markup tables used by the renderer.

/// Tags that self-close when written without content, unless configured otherwise.
/// https://html.spec.whatwg.org/multipage/syntax.html#void-elements
pub const DEFAULT_AUTOCLOSE: &[&str] = &[
    "meta", "img", "link", "br", "hr", "input", "area", "param", "col", "base",
];

const XHTML_TRANSITIONAL: &str = "<!DOCTYPE html PUBLIC \"-//W3C//DTD XHTML 1.0 Transitional//EN\" \"http://www.w3.org/TR/xhtml1/DTD/xhtml1-transitional.dtd\">";

/// `!!! <variant>` declarations, matched case-insensitively.
const DOCTYPES: &[(&str, &str)] = &[
    ("", XHTML_TRANSITIONAL),
    ("5", "<!DOCTYPE html>"),
    ("strict", "<!DOCTYPE html PUBLIC \"-//W3C//DTD XHTML 1.0 Strict//EN\" \"http://www.w3.org/TR/xhtml1/DTD/xhtml1-strict.dtd\">"),
    ("frameset", "<!DOCTYPE html PUBLIC \"-//W3C//DTD XHTML 1.0 Frameset//EN\" \"http://www.w3.org/TR/xhtml1/DTD/xhtml1-frameset.dtd\">"),
    ("1.1", "<!DOCTYPE html PUBLIC \"-//W3C//DTD XHTML 1.1//EN\" \"http://www.w3.org/TR/xhtml11/DTD/xhtml11.dtd\">"),
    ("basic", "<!DOCTYPE html PUBLIC \"-//W3C//DTD XHTML Basic 1.1//EN\" \"http://www.w3.org/TR/xhtml-basic/xhtml-basic11.dtd\">"),
    ("mobile", "<!DOCTYPE html PUBLIC \"-//WAPFORUM//DTD XHTML Mobile 1.2//EN\" \"http://www.openmobilealliance.org/tech/DTD/xhtml-mobile12.dtd\">"),
];

/// Declaration for the text after `!!!`. Unknown variants fall back to
/// XHTML 1.0 Transitional; `XML [encoding]` gives the XML prolog.
pub fn doctype(variant: &str) -> String {
    let variant = variant.trim();
    let mut words = variant.split_whitespace();
    if words.next().is_some_and(|word| word.eq_ignore_ascii_case("xml")) {
        let encoding = words.next().unwrap_or("utf-8");
        return format!("<?xml version='1.0' encoding='{}' ?>", encoding);
    }

    DOCTYPES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(variant))
        .map(|(_, declaration)| declaration.to_string())
        .unwrap_or_else(|| XHTML_TRANSITIONAL.to_string())
}

/// Element names: a letter, `_` or `:` followed by letters, digits, `_`, `-`, `:` or `.`.
pub fn is_legal_tag(tag: &str) -> bool {
    let mut chars = tag.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' || first == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ':' | '.'))
}
