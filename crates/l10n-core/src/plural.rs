use schemars::gen::SchemaGenerator;
use schemars::schema::Schema;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Separator between plural variants in the raw storage encoding.
pub const PLURAL_SEPARATOR: char = '\0';

/// A source or translated text with one or more plural variants.
///
/// Storage keeps the variants joined by NUL in a single text field; this type
/// is the only place that encoding is split or joined. A text always carries
/// at least one variant, so splitting an empty string yields `[""]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct PluralText {
    variants: Vec<String>,
}

impl PluralText {
    pub fn new(variants: Vec<String>) -> Self {
        if variants.is_empty() {
            return Self::single("");
        }
        Self { variants }
    }

    pub fn single(text: impl Into<String>) -> Self {
        Self {
            variants: vec![text.into()],
        }
    }

    /// Build a singular/plural pair.
    pub fn plural(singular: impl Into<String>, plural: impl Into<String>) -> Self {
        Self {
            variants: vec![singular.into(), plural.into()],
        }
    }

    /// Decode the NUL-joined storage form.
    pub fn from_raw(raw: &str) -> Self {
        Self {
            variants: raw.split(PLURAL_SEPARATOR).map(str::to_string).collect(),
        }
    }

    /// Encode into the NUL-joined storage form.
    pub fn to_raw(&self) -> String {
        self.variants.join("\0")
    }

    pub fn variants(&self) -> &[String] {
        &self.variants
    }

    pub fn is_plural(&self) -> bool {
        self.variants.len() > 1
    }

    pub fn singular(&self) -> &str {
        &self.variants[0]
    }

    /// The plural source form, when this text has one.
    pub fn plural_form(&self) -> Option<&str> {
        self.variants.get(1).map(String::as_str)
    }

    /// True when every variant is empty.
    pub fn is_empty(&self) -> bool {
        self.variants.iter().all(String::is_empty)
    }
}

impl Default for PluralText {
    fn default() -> Self {
        Self::single("")
    }
}

impl From<String> for PluralText {
    fn from(raw: String) -> Self {
        Self::from_raw(&raw)
    }
}

impl From<&str> for PluralText {
    fn from(raw: &str) -> Self {
        Self::from_raw(raw)
    }
}

impl From<PluralText> for String {
    fn from(text: PluralText) -> Self {
        text.to_raw()
    }
}

impl JsonSchema for PluralText {
    fn schema_name() -> String {
        "PluralText".to_owned()
    }

    fn json_schema(gen: &mut SchemaGenerator) -> Schema {
        String::json_schema(gen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_nul_joined_variants() {
        let t = PluralText::from_raw("one\0many");
        assert!(t.is_plural());
        assert_eq!(t.singular(), "one");
        assert_eq!(t.plural_form(), Some("many"));
        assert_eq!(t.to_raw(), "one\0many");
    }

    #[test]
    fn empty_raw_is_one_empty_variant() {
        let t = PluralText::from_raw("");
        assert_eq!(t.variants(), &[String::new()]);
        assert!(!t.is_plural());
        assert!(t.is_empty());
        assert_eq!(PluralText::new(Vec::new()), t);
    }

    #[test]
    fn backslash_o_is_not_a_separator() {
        let t = PluralText::from_raw("one\\Omany");
        assert!(!t.is_plural());
        assert_eq!(t.singular(), "one\\Omany");
    }

    #[test]
    fn serializes_as_raw_string() {
        let t = PluralText::plural("file", "files");
        let raw: String = t.clone().into();
        assert_eq!(raw, "file\0files");
        assert_eq!(PluralText::from(raw), t);
    }
}
