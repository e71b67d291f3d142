//! Scalar percent-encoding and decoding.
//!
//! These are the default implementations behind [`Decoder`](crate::Decoder) and
//! [`Encoder`](crate::Encoder). They operate on one key or value at a time and never
//! fail: malformed escapes pass through literally.
//!
//! ```rust
//! use qs_codec::utils::{decode, encode};
//! use qs_codec::{Charset, Format, Value};
//!
//! assert_eq!(decode("a+b%20c", Charset::Utf8), "a b c");
//! assert_eq!(encode(&Value::from("a b"), Charset::Utf8, Format::Rfc3986), "a%20b");
//! assert_eq!(encode(&Value::from("a b"), Charset::Utf8, Format::Rfc1738), "a+b");
//! ```

use crate::{Charset, Format, Value};
use regex::{Captures, Regex};
use std::sync::OnceLock;

/// `utf8=✓` percent-encoded as UTF-8.
pub const UTF8_SENTINEL: &str = "utf8=%E2%9C%93";

/// `utf8=✓` as a browser submitting ISO-8859-1 writes it (`&#10003;`).
pub const LATIN1_SENTINEL: &str = "utf8=%26%2310003%3B";

const HEX: &[u8; 16] = b"0123456789ABCDEF";

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

fn push_escaped(out: &mut String, byte: u8) {
    out.push('%');
    out.push(HEX[(byte >> 4) as usize] as char);
    out.push(HEX[(byte & 0x0F) as usize] as char);
}

/// Decodes one scalar: `+` becomes a space, then percent escapes are resolved.
///
/// UTF-8 decoding is all-or-nothing: a malformed escape or an invalid byte sequence
/// returns the input (with `+` already replaced) untouched. Latin-1 maps each valid
/// `%XX` to U+00XX and leaves anything else literal.
///
/// # Examples
///
/// ```rust
/// use qs_codec::utils::decode;
/// use qs_codec::Charset;
///
/// assert_eq!(decode("%E2%9C%93", Charset::Utf8), "✓");
/// assert_eq!(decode("%E9", Charset::Latin1), "é");
/// assert_eq!(decode("100%", Charset::Utf8), "100%");
/// ```
#[must_use]
pub fn decode(input: &str, charset: Charset) -> String {
    let without_plus = input.replace('+', " ");
    if !without_plus.contains('%') {
        return without_plus;
    }
    match charset {
        Charset::Latin1 => unescape_latin1(&without_plus),
        Charset::Utf8 => unescape_utf8(&without_plus).unwrap_or(without_plus),
    }
}

fn unescape_utf8(input: &str) -> Option<String> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hi = bytes.get(i + 1).copied().and_then(hex_value)?;
            let lo = bytes.get(i + 2).copied().and_then(hex_value)?;
            out.push((hi << 4) | lo);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

fn unescape_latin1(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = String::with_capacity(input.len());
    let mut last = 0;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hi = bytes.get(i + 1).copied().and_then(hex_value);
            let lo = bytes.get(i + 2).copied().and_then(hex_value);
            if let (Some(hi), Some(lo)) = (hi, lo) {
                out.push_str(&input[last..i]);
                out.push(char::from((hi << 4) | lo));
                i += 3;
                last = i;
                continue;
            }
        }
        i += 1;
    }
    out.push_str(&input[last..]);
    out
}

fn is_unreserved(byte: u8, format: Format) -> bool {
    byte.is_ascii_alphanumeric()
        || matches!(byte, b'-' | b'.' | b'_' | b'~')
        || (format == Format::Rfc1738 && matches!(byte, b'(' | b')'))
}

/// The legacy `escape()` safe set used for ISO-8859-1 output.
fn is_latin1_safe(unit: u16) -> bool {
    u8::try_from(unit).map_or(false, |b| {
        b.is_ascii_alphanumeric() || matches!(b, b'@' | b'*' | b'_' | b'+' | b'-' | b'.' | b'/')
    })
}

/// Percent-encodes one scalar.
///
/// Strings, numbers, booleans and dates are encoded through their text form; bytes are
/// escaped byte by byte. Under Latin-1, characters outside ISO-8859-1 are written as
/// numeric entities (`%26%23NNN%3B`).
///
/// The format only affects which characters stay literal; use [`apply_format`] for
/// the `%20` → `+` step.
///
/// # Examples
///
/// ```rust
/// use qs_codec::utils::encode;
/// use qs_codec::{Charset, Format, Value};
///
/// assert_eq!(encode(&Value::from("ä"), Charset::Utf8, Format::Rfc3986), "%C3%A4");
/// assert_eq!(encode(&Value::from("ä"), Charset::Latin1, Format::Rfc3986), "%E4");
/// assert_eq!(encode(&Value::from("☺"), Charset::Latin1, Format::Rfc3986), "%26%239786%3B");
/// ```
#[must_use]
pub fn encode(value: &Value, charset: Charset, format: Format) -> String {
    if let Value::Bytes(bytes) = value {
        let mut out = String::with_capacity(bytes.len() * 3);
        for &byte in bytes {
            let safe = match charset {
                Charset::Utf8 => is_unreserved(byte, format),
                Charset::Latin1 => is_latin1_safe(u16::from(byte)),
            };
            if safe {
                out.push(char::from(byte));
            } else {
                push_escaped(&mut out, byte);
            }
        }
        return out;
    }

    let text = value.to_string();
    if text.is_empty() {
        return text;
    }

    let mut out = String::with_capacity(text.len() * 3);
    match charset {
        Charset::Latin1 => {
            for unit in text.encode_utf16() {
                if is_latin1_safe(unit) {
                    out.push(char::from(unit as u8));
                } else if unit < 0x100 {
                    push_escaped(&mut out, unit as u8);
                } else {
                    out.push_str("%26%23");
                    out.push_str(&unit.to_string());
                    out.push_str("%3B");
                }
            }
        }
        Charset::Utf8 => {
            for &byte in text.as_bytes() {
                if is_unreserved(byte, format) {
                    out.push(char::from(byte));
                } else {
                    push_escaped(&mut out, byte);
                }
            }
        }
    }
    out
}

/// Applies the format profile to an already-encoded token.
///
/// # Examples
///
/// ```rust
/// use qs_codec::utils::apply_format;
/// use qs_codec::Format;
///
/// assert_eq!(apply_format("a%20b", Format::Rfc1738), "a+b");
/// assert_eq!(apply_format("a%20b", Format::Rfc3986), "a%20b");
/// ```
#[must_use]
pub fn apply_format(encoded: &str, format: Format) -> String {
    match format {
        Format::Rfc3986 => encoded.to_string(),
        Format::Rfc1738 => encoded.replace("%20", "+"),
    }
}

fn numeric_entity() -> &'static Regex {
    static ENTITY: OnceLock<Regex> = OnceLock::new();
    ENTITY.get_or_init(|| Regex::new(r"&#(\d+);").expect("static pattern"))
}

/// Replaces HTML numeric entities (`&#9786;`) with the characters they name.
///
/// Entities naming an invalid code point are left as written.
///
/// # Examples
///
/// ```rust
/// use qs_codec::utils::interpret_numeric_entities;
///
/// assert_eq!(interpret_numeric_entities("&#9786; and &#65;"), "☺ and A");
/// ```
#[must_use]
pub fn interpret_numeric_entities(input: &str) -> String {
    if !input.contains("&#") {
        return input.to_string();
    }
    numeric_entity()
        .replace_all(input, |caps: &Captures<'_>| {
            caps[1]
                .parse::<u32>()
                .ok()
                .and_then(char::from_u32)
                .map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}
