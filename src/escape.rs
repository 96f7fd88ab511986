//! Lisp string escaping.

/// Escape `text` for use between double quotes in Lisp source.
///
/// Only `\` and `"` are rewritten; every other character, including control
/// characters and non-ASCII text, passes through unchanged.
pub fn escape_lisp_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            _ => out.push(ch),
        }
    }
    out
}

/// Undo [`escape_lisp_string`].
///
/// Besides `\\` and `\"` the common `\n`, `\t` and `\r` escapes are accepted.
/// Any other escaped character stands for itself. Returns `None` when the input
/// ends with a lone backslash.
pub fn unescape_lisp_string(text: &str) -> Option<String> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        let escaped = chars.next()?;
        out.push(match escaped {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            other => other,
        });
    }
    Some(out)
}
