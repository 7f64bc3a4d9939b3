use std::sync::LazyLock;

use regex::{Captures, Regex};

static UNICODE_ESCAPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\u([0-9a-fA-F]{4})(?:\\u([0-9a-fA-F]{4}))?").unwrap());

const SIMPLE_ESCAPES: &[(&str, &str)] = &[
    ("\\n", "\n"),
    ("\\t", "\t"),
    ("\\r", "\r"),
    ("\\\"", "\""),
    ("\\/", "/"),
    ("\\\\", "\\"),
    ("\\u003c", "<"),
    ("\\u003e", ">"),
    ("\\u0026", "&"),
    ("\\u0027", "'"),
];

/// Decodes backslash and `\uXXXX` escapes into literal text.
///
/// The replacement pass is repeated until nothing changes, so doubly escaped
/// input is fully decoded and `normalize(normalize(s)) == normalize(s)`.
/// Escapes that do not name a valid scalar value (lone surrogates) stay as-is.
pub fn normalize(text: &str) -> String {
    let mut current = text.to_owned();
    loop {
        let next = normalize_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn normalize_once(text: &str) -> String {
    if !text.contains('\\') {
        return text.to_owned();
    }

    let mut out = text.to_owned();
    for (escape, literal) in SIMPLE_ESCAPES {
        if out.contains(escape) {
            out = out.replace(escape, literal);
        }
    }

    UNICODE_ESCAPE_RE
        .replace_all(&out, |caps: &Captures<'_>| decode_unicode_escape(caps))
        .into_owned()
}

fn decode_unicode_escape(caps: &Captures<'_>) -> String {
    let whole = &caps[0];
    let Some(high) = parse_hex(&caps[1]) else {
        return whole.to_owned();
    };

    if let Some(low) = caps.get(2).and_then(|m| parse_hex(m.as_str())) {
        if (0xD800..0xDC00).contains(&high) && (0xDC00..0xE000).contains(&low) {
            let combined = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
            if let Some(ch) = char::from_u32(combined) {
                return ch.to_string();
            }
        }
        // Not a surrogate pair: decode both halves on their own.
        let second = &whole[6..];
        return format!("{}{}", decode_single(high, &whole[..6]), decode_single(low, second));
    }

    decode_single(high, whole)
}

fn decode_single(code: u32, original: &str) -> String {
    match char::from_u32(code) {
        Some(ch) => ch.to_string(),
        None => original.to_owned(),
    }
}

fn parse_hex(hex: &str) -> Option<u32> {
    u32::from_str_radix(hex, 16).ok()
}
