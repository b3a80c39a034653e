//! Low-level PO string formatting.
//!
//! Output follows the classic gettext layout: C-style escapes for control
//! characters, a hard break after every `\n` escape, and word wrapping at
//! [`WRAP_WIDTH`] columns with the breaking space kept at the end of the line.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};

pub const WRAP_WIDTH: usize = 70;

/// Placeholder used for `PO-Revision-Date` when no translation exists yet.
pub const REVISION_DATE_PLACEHOLDER: &str = "YYYY-mm-DD HH:MM+ZZZZ";

/// Escape backslash, double quote and every control character below 0x20.
pub fn escape_po(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 8);
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\x07' => out.push_str("\\a"),
            '\x08' => out.push_str("\\b"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\x0b' => out.push_str("\\v"),
            '\x0c' => out.push_str("\\f"),
            '\r' => out.push_str("\\r"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\{:03o}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

/// Greedy word wrap on spaces. Width is measured in bytes.
pub(crate) fn wrap_words(s: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut cur = String::new();
    let mut cur_len = 0usize;
    for (i, word) in s.split(' ').enumerate() {
        let word_len = word.len();
        if i == 0 {
            cur.push_str(word);
            cur_len = word_len;
        } else if cur_len + 1 + word_len > width {
            cur.push(' ');
            lines.push(std::mem::take(&mut cur));
            cur.push_str(word);
            cur_len = word_len;
        } else {
            cur.push(' ');
            cur.push_str(word);
            cur_len += 1 + word_len;
        }
    }
    lines.push(cur);
    lines
}

/// Escaped physical lines of a PO string, without quotes.
pub fn po_string_lines(s: &str) -> Vec<String> {
    let escaped = escape_po(s);
    let mut parts = Vec::new();
    let mut rest = escaped.as_str();
    while !rest.is_empty() {
        let (chunk, tail) = match rest.find("\\n") {
            Some(i) => rest.split_at(i + 2),
            None => (rest, ""),
        };
        parts.extend(wrap_words(chunk, WRAP_WIDTH));
        rest = tail;
    }
    parts
}

/// Quoted PO string including the trailing newline. Multi-line values start
/// with an empty `""` line.
pub fn po_quoted(s: &str) -> String {
    let parts = po_string_lines(s);
    match parts.as_slice() {
        [] => "\"\"\n".to_string(),
        [single] => format!("\"{single}\"\n"),
        _ => {
            let mut out = String::from("\"\"\n");
            for p in &parts {
                out.push('"');
                out.push_str(p);
                out.push_str("\"\n");
            }
            out
        }
    }
}

/// Header date format, e.g. `2024-03-01 12:30+0000`.
pub fn po_date(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M%z").to_string()
}
