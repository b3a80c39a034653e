use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::PluralText;

/// Where a string occurrence is used at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum OccurrenceType {
    Installer,
    Runtime,
    Both,
}

impl OccurrenceType {
    /// Two different kinds seen for one string elevate it to `Both`.
    pub fn merge(self, other: OccurrenceType) -> OccurrenceType {
        if self == other {
            self
        } else {
            OccurrenceType::Both
        }
    }

    pub fn is_installer(self) -> bool {
        matches!(self, OccurrenceType::Installer | OccurrenceType::Both)
    }
}

/// A distinct translatable text of a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SourceString {
    pub id: u64,
    pub value: PluralText,
    #[serde(default)]
    pub context: String,
    pub hash_key: String,
}

impl SourceString {
    pub fn new(id: u64, value: PluralText, context: impl Into<String>) -> Self {
        let context = context.into();
        let hash_key = Self::hash_key_for(&value, &context);
        Self {
            id,
            value,
            context,
            hash_key,
        }
    }

    /// Deduplication key for a `(value, context)` pair.
    ///
    /// Value and context are separated by EOT, the same byte gettext uses
    /// between msgctxt and msgid in compiled catalogs.
    pub fn hash_key_for(value: &PluralText, context: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(value.to_raw().as_bytes());
        hasher.update([0x04]);
        hasher.update(context.as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// One occurrence of a source string in a file of a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Line {
    pub sid: u64,
    pub release_id: u64,
    pub file_path: String,
    /// Version-control revision tag of the scanned file.
    #[serde(default)]
    pub revision: String,
    pub lineno: u32,
    pub kind: OccurrenceType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Translation {
    pub id: u64,
    pub sid: u64,
    pub language: String,
    pub text: PluralText,
    pub is_suggestion: bool,
    pub is_active: bool,
    pub time_entered: DateTime<Utc>,
    pub time_changed: DateTime<Utc>,
    #[serde(default)]
    pub uid: u64,
}

impl Translation {
    /// The approved translation of a string; at most one per (sid, language).
    pub fn is_accepted(&self) -> bool {
        self.is_active && !self.is_suggestion
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Project {
    pub id: u64,
    pub uri: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Release {
    pub id: u64,
    pub project_id: u64,
    pub title: String,
    #[serde(default)]
    pub download_link: Option<String>,
    #[serde(default)]
    pub file_date: Option<DateTime<Utc>>,
}

/// Core tag used for releases without a legacy `N.x-` prefix.
pub const CORE_ALL: &str = "all";

impl Release {
    /// Split `7.x-1.3-rc1` into (`Some("7.x")`, `"1.3"`, `Some("rc1")`).
    fn parts(&self) -> (Option<&str>, &str, Option<&str>) {
        let title = self.title.as_str();
        let (core, rest) = match title.split_once(".x-") {
            Some((major, rest))
                if !major.is_empty()
                    && major.bytes().all(|b| b.is_ascii_digit())
                    && rest.starts_with(|c: char| c.is_ascii_digit()) =>
            {
                (Some(&title[..major.len() + 2]), rest)
            }
            _ => (None, title),
        };
        match rest.split_once('-') {
            Some((version, extra)) => (core, version, Some(extra)),
            None => (core, rest, None),
        }
    }

    /// Core compatibility tag: `7.x` for `7.x-1.3`, `all` otherwise.
    pub fn core(&self) -> &str {
        self.parts().0.unwrap_or(CORE_ALL)
    }

    /// Version without core prefix and extra suffix.
    pub fn version(&self) -> &str {
        self.parts().1
    }

    /// Suffix after the version, e.g. `rc1` or `dev`.
    pub fn extra(&self) -> Option<&str> {
        self.parts().2
    }

    /// The release line this version belongs to: `9.1.0` → `9.1.x`,
    /// `7.x-1.3-rc1` → `7.x-1.x`.
    pub fn branch(&self) -> String {
        let (core, version, _) = self.parts();
        let line = match version.rsplit_once('.') {
            Some((head, _)) => format!("{head}.x"),
            None if version == "x" => version.to_string(),
            None => format!("{version}.x"),
        };
        match core {
            Some(core) => format!("{core}-{line}"),
            None => line,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Language {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub plurals: u32,
    #[serde(default)]
    pub formula: String,
}

impl Language {
    /// Number of `msgstr[n]` lines for an untranslated plural string.
    pub fn plural_count(&self) -> usize {
        if self.plurals == 0 {
            2
        } else {
            self.plurals as usize
        }
    }

    /// `Plural-Forms` header value, when the language defines a formula.
    pub fn plural_forms(&self) -> Option<String> {
        if self.plurals == 0 || self.formula.is_empty() {
            return None;
        }
        Some(format!(
            "nplurals={}; plural={};",
            self.plurals,
            self.formula.replace('$', "")
        ))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PackageStatus {
    #[default]
    Active,
    Disabled,
    Error,
}

/// Release-wide packaging bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PackageRecord {
    pub release_id: u64,
    /// Last time every language of the release was evaluated.
    #[serde(default)]
    pub checked: Option<DateTime<Utc>>,
    /// Last time any file of the release was written.
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: PackageStatus,
}

impl PackageRecord {
    pub fn new(release_id: u64) -> Self {
        Self {
            release_id,
            checked: None,
            updated: None,
            status: PackageStatus::Active,
        }
    }

    /// A previous pass wrote files but never finished all languages.
    pub fn is_interrupted(&self) -> bool {
        match (self.checked, self.updated) {
            (_, None) => false,
            (None, Some(_)) => true,
            (Some(checked), Some(updated)) => checked < updated,
        }
    }
}

/// Generated artifact for one release and language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PackagedFile {
    pub release_id: u64,
    pub language: String,
    pub path: String,
    pub sid_count: usize,
    pub checked_at: DateTime<Utc>,
}
