use color_eyre::eyre::{eyre, Result, WrapErr};
use l10n_core::PluralText;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One message of a PO file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoMessage {
    pub context: Option<String>,
    pub msgid: String,
    pub msgid_plural: Option<String>,
    /// `msgstr`, or `msgstr[0..n]` for plural messages.
    pub msgstr: Vec<String>,
    pub fuzzy: bool,
    /// `#:` references, one item per `path:line` token.
    pub references: Vec<String>,
}

impl PoMessage {
    /// Source text in storage form (singular and plural joined).
    pub fn source(&self) -> PluralText {
        match &self.msgid_plural {
            Some(p) => PluralText::plural(self.msgid.clone(), p.clone()),
            None => PluralText::single(self.msgid.clone()),
        }
    }

    pub fn translation(&self) -> PluralText {
        PluralText::new(self.msgstr.clone())
    }

    pub fn is_header(&self) -> bool {
        self.msgid.is_empty() && self.context.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Ctxt,
    Id,
    IdPlural,
    Str(usize),
}

#[derive(Default)]
struct Pending {
    msg: PoMessage,
    field: Option<Field>,
    seen_id: bool,
}

impl Pending {
    fn push_text(&mut self, field: Field, text: &str) {
        match field {
            Field::Ctxt => self.msg.context.get_or_insert_with(String::new).push_str(text),
            Field::Id => self.msg.msgid.push_str(text),
            Field::IdPlural => self
                .msg
                .msgid_plural
                .get_or_insert_with(String::new)
                .push_str(text),
            Field::Str(i) => {
                if self.msg.msgstr.len() <= i {
                    self.msg.msgstr.resize(i + 1, String::new());
                }
                self.msg.msgstr[i].push_str(text);
            }
        }
    }

    fn is_started(&self) -> bool {
        self.seen_id || self.msg.context.is_some()
    }
}

/// Parse PO text. The header entry and obsolete (`#~`) messages are skipped.
pub fn read_po_str(text: &str) -> Result<Vec<PoMessage>> {
    let mut out = Vec::new();
    let mut cur = Pending::default();

    let mut flush = |cur: &mut Pending| {
        let done = std::mem::take(cur);
        if done.seen_id && !done.msg.is_header() {
            out.push(done.msg);
        }
    };

    for (idx, line) in text.lines().enumerate() {
        let lineno = idx + 1;
        let lt = line.trim();

        if lt.is_empty() {
            flush(&mut cur);
            continue;
        }
        if lt.starts_with("#~") {
            continue;
        }
        if let Some(refs) = lt.strip_prefix("#:") {
            if cur.is_started() {
                flush(&mut cur);
            }
            for r in refs.split(|c: char| c == ';' || c.is_whitespace()) {
                if !r.is_empty() {
                    cur.msg.references.push(r.to_string());
                }
            }
            continue;
        }
        if let Some(flags) = lt.strip_prefix("#,") {
            if cur.is_started() {
                flush(&mut cur);
            }
            if flags.split(',').any(|f| f.trim() == "fuzzy") {
                cur.msg.fuzzy = true;
            }
            continue;
        }
        if lt.starts_with('#') {
            continue;
        }

        let (field, rest) = if let Some(rest) = lt.strip_prefix("msgctxt") {
            if cur.is_started() {
                flush(&mut cur);
            }
            (Field::Ctxt, rest)
        } else if let Some(rest) = lt.strip_prefix("msgid_plural") {
            (Field::IdPlural, rest)
        } else if let Some(rest) = lt.strip_prefix("msgid") {
            if cur.seen_id {
                flush(&mut cur);
            }
            cur.seen_id = true;
            (Field::Id, rest)
        } else if let Some(rest) = lt.strip_prefix("msgstr[") {
            let (n, rest) = rest
                .split_once(']')
                .ok_or_else(|| eyre!("line {lineno}: unterminated msgstr index"))?;
            let n: usize = n
                .trim()
                .parse()
                .wrap_err_with(|| format!("line {lineno}: bad msgstr index {n:?}"))?;
            (Field::Str(n), rest)
        } else if let Some(rest) = lt.strip_prefix("msgstr") {
            (Field::Str(0), rest)
        } else if lt.starts_with('"') {
            let field = cur
                .field
                .ok_or_else(|| eyre!("line {lineno}: continuation without keyword"))?;
            let text = parse_po_string(lt).wrap_err_with(|| format!("line {lineno}"))?;
            cur.push_text(field, &text);
            continue;
        } else {
            return Err(eyre!("line {lineno}: unexpected content: {lt}"));
        };

        let text = parse_po_string(rest).wrap_err_with(|| format!("line {lineno}"))?;
        cur.field = Some(field);
        cur.push_text(field, &text);
    }
    flush(&mut cur);

    Ok(out)
}

pub fn read_po_file(path: &Path) -> Result<Vec<PoMessage>> {
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("cannot read {}", path.display()))?;
    read_po_str(&text).wrap_err_with(|| format!("invalid PO file {}", path.display()))
}

/// Unquote and unescape one PO string literal.
fn parse_po_string(s: &str) -> Result<String> {
    let s = s.trim();
    if s.len() < 2 || !s.starts_with('"') || !s.ends_with('"') {
        return Err(eyre!("invalid po string: {s}"));
    }
    let inner = &s[1..s.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('a') => out.push('\x07'),
            Some('b') => out.push('\x08'),
            Some('v') => out.push('\x0b'),
            Some('f') => out.push('\x0c'),
            Some(d @ '0'..='7') => {
                let mut code = d.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek().and_then(|c| c.to_digit(8)) {
                        Some(v) => {
                            code = code * 8 + v;
                            chars.next();
                        }
                        None => break,
                    }
                }
                out.push(char::from_u32(code).unwrap_or('\u{fffd}'));
            }
            Some(other) => out.push(other),
            None => return Err(eyre!("dangling escape in {s}")),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"# German translation of Drupal core (9.1.0)
#
msgid ""
msgstr ""
"Project-Id-Version: Drupal core (9.1.0)\n"
"Plural-Forms: nplurals=2; plural=(n!=1);\n"

#: core/modules/node.module:12,40; core/modules/user.module:5
msgid "Save"
msgstr "Speichern"

#, fuzzy
msgctxt "Long month name"
msgid "May"
msgstr "Mai"

msgid "1 item"
msgid_plural "@count items"
msgstr[0] "1 Element"
msgstr[1] "@count Elemente"

msgid ""
"Hello\n"
"World"
msgstr "Hallo\nWelt\000"

#~ msgid "Old"
#~ msgstr "Alt"
"#;

    #[test]
    fn reads_messages_skipping_header() {
        let msgs = read_po_str(SAMPLE).unwrap();
        assert_eq!(msgs.len(), 4);

        assert_eq!(msgs[0].msgid, "Save");
        assert_eq!(msgs[0].msgstr, vec!["Speichern".to_string()]);
        assert_eq!(
            msgs[0].references,
            vec![
                "core/modules/node.module:12,40".to_string(),
                "core/modules/user.module:5".to_string()
            ]
        );

        assert!(msgs[1].fuzzy);
        assert_eq!(msgs[1].context.as_deref(), Some("Long month name"));

        assert_eq!(msgs[2].source().to_raw(), "1 item\0@count items");
        assert_eq!(msgs[2].translation().to_raw(), "1 Element\0@count Elemente");

        assert_eq!(msgs[3].msgid, "Hello\nWorld");
        assert_eq!(msgs[3].msgstr[0], "Hallo\nWelt\0");
    }

    #[test]
    fn compact_files_without_blank_lines_still_split() {
        let text = "msgid \"\"\nmsgstr \"\"\n\"Language-Team: German\\n\"\n\nmsgid \"A\"\nmsgstr \"a\"\nmsgid \"B\"\nmsgstr \"b\"\n#, fuzzy\nmsgid \"C\"\nmsgstr \"c\"\n";
        let msgs = read_po_str(text).unwrap();
        let ids: Vec<_> = msgs.iter().map(|m| m.msgid.as_str()).collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
        assert!(!msgs[1].fuzzy);
        assert!(msgs[2].fuzzy);
    }

    #[test]
    fn rejects_garbage() {
        assert!(read_po_str("msgid Save\n").is_err());
        assert!(read_po_str("\"orphan\"\n").is_err());
    }

    #[test]
    fn reads_files_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("drupal-9.1.0.de.po");
        std::fs::write(&path, SAMPLE).unwrap();
        assert_eq!(read_po_file(&path).unwrap().len(), 4);
        assert!(read_po_file(&dir.path().join("missing.po")).is_err());
    }
}
