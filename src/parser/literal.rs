//! Literal decoding for the attribute hash grammar.
//!
//! Every decoder takes the literal exactly as written in the source (quotes
//! and suffixes included) and returns its canonical text form.

use thiserror::Error;

/// A numeric literal that does not parse, or a quoted literal missing its quotes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed {kind} literal '{text}'")]
pub struct LiteralError {
    pub kind: &'static str,
    pub text: String,
}

impl LiteralError {
    fn new(kind: &'static str, text: &str) -> Self {
        Self {
            kind,
            text: text.to_string(),
        }
    }
}

/// Decode a quoted string.
///
/// Double-quoted strings have their backslash escapes resolved; single-quoted
/// strings are taken literally.
pub fn decode_string(lit: &str) -> Result<String, LiteralError> {
    let quote = lit.chars().next().ok_or_else(|| LiteralError::new("string", lit))?;
    if lit.len() < 2 || !(quote == '"' || quote == '\'') || !lit.ends_with(quote) {
        return Err(LiteralError::new("string", lit));
    }
    let inner = &lit[1..lit.len() - 1];
    if quote == '\'' {
        Ok(inner.to_string())
    } else {
        Ok(unescape(inner))
    }
}

/// Decode a single-quoted character literal.
pub fn decode_char(lit: &str) -> Result<String, LiteralError> {
    decode_string(lit)
}

/// Decode an integer literal: `0x` hexadecimal, leading `0` octal, otherwise
/// decimal. A trailing `l`/`L` is accepted.
pub fn decode_integer(lit: &str) -> Result<String, LiteralError> {
    let body = lit.strip_suffix(['l', 'L']).unwrap_or(lit);
    let (negative, body) = match body.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, body),
    };

    let (digits, radix) = if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        (hex, 16)
    } else if body.len() > 1 && body.starts_with('0') {
        (&body[1..], 8)
    } else {
        (body, 10)
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(LiteralError::new("integer", lit));
    }

    let value = i64::from_str_radix(digits, radix).map_err(|_| LiteralError::new("integer", lit))?;
    Ok(if negative { (-value).to_string() } else { value.to_string() })
}

/// Decode a long literal (an integer literal with a mandatory `l`/`L` suffix).
pub fn decode_long(lit: &str) -> Result<String, LiteralError> {
    match lit.strip_suffix(['l', 'L']) {
        Some(body) => decode_integer(body).map_err(|_| LiteralError::new("long", lit)),
        None => Err(LiteralError::new("long", lit)),
    }
}

/// Decode a float literal (optional `f`/`F` suffix).
pub fn decode_float(lit: &str) -> Result<String, LiteralError> {
    decode_floating(lit.strip_suffix(['f', 'F']).unwrap_or(lit), "float", lit)
}

/// Decode a double literal (optional `d`/`D` suffix).
pub fn decode_double(lit: &str) -> Result<String, LiteralError> {
    decode_floating(lit.strip_suffix(['d', 'D']).unwrap_or(lit), "double", lit)
}

/// Decode any numeric literal, picking the decoder from its shape.
pub fn decode_number(lit: &str) -> Result<String, LiteralError> {
    let unsigned = lit.strip_prefix('-').unwrap_or(lit);
    if unsigned.starts_with("0x") || unsigned.starts_with("0X") {
        return decode_integer(lit);
    }
    if unsigned.ends_with(['f', 'F']) {
        return decode_float(lit);
    }
    if unsigned.ends_with(['d', 'D']) || unsigned.contains(['.', 'e', 'E']) {
        return decode_double(lit);
    }
    if unsigned.ends_with(['l', 'L']) {
        return decode_long(lit);
    }
    decode_integer(lit)
}

fn decode_floating(body: &str, kind: &'static str, lit: &str) -> Result<String, LiteralError> {
    let unsigned = body.strip_prefix('-').unwrap_or(body);
    // Rust accepts "inf" and "NaN"; the attribute grammar does not.
    if !unsigned.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return Err(LiteralError::new(kind, lit));
    }
    match body.parse::<f64>() {
        Ok(value) if value.is_finite() => {
            let text = value.to_string();
            Ok(if text.contains('.') { text } else { format!("{}.0", text) })
        }
        _ => Err(LiteralError::new(kind, lit)),
    }
}

/// Resolve backslash escapes the way the host language does.
fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        let Some(next) = chars.next() else {
            out.push('\\');
            break;
        };
        match next {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            '"' => out.push('"'),
            '\'' => out.push('\''),
            '\\' => out.push('\\'),
            'u' => {
                while chars.peek() == Some(&'u') {
                    chars.next();
                }
                let hex: String = chars.clone().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) if hex.len() == 4 => {
                        out.push(decoded);
                        for _ in 0..4 {
                            chars.next();
                        }
                    }
                    _ => {
                        out.push('\\');
                        out.push('u');
                    }
                }
            }
            '0'..='7' => {
                let mut value = next.to_digit(8).unwrap_or(0);
                let max_digits = if next <= '3' { 3 } else { 2 };
                let mut taken = 1;
                while taken < max_digits {
                    match chars.peek().and_then(|c| c.to_digit(8)) {
                        Some(digit) => {
                            value = value * 8 + digit;
                            chars.next();
                            taken += 1;
                        }
                        None => break,
                    }
                }
                out.push(char::from_u32(value).unwrap_or('\u{fffd}'));
            }
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }

    out
}
