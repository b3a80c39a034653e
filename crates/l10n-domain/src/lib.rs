use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExportReport {
    pub schema_version: u32,
    pub project: String,
    pub release: Option<String>,
    pub language: Option<String>,
    pub template: bool,
    pub filename: String,
    /// Where the file was written; `None` when printed to stdout.
    pub path: Option<String>,
    pub strings: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PackagedLanguage {
    pub language: String,
    /// `None` when nothing was written for this language.
    pub path: Option<String>,
    pub strings: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PackageReport {
    pub schema_version: u32,
    pub release_id: u64,
    pub release: String,
    pub project: String,
    pub languages: Vec<PackagedLanguage>,
    pub checked: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
}

impl PackageReport {
    pub fn files_written(&self) -> usize {
        self.languages.iter().filter(|l| l.path.is_some()).count()
    }
}

/// One-line summary of a queue run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct QueueSummary {
    pub releases_checked: usize,
    pub files_updated: usize,
    pub elapsed_ms: u64,
}

/// An upstream release discovered by a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ReleaseCandidate {
    pub source: String,
    pub project: String,
    pub version: String,
    pub download_link: Option<String>,
    pub file_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ImportSummary {
    pub added: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub suggestions: usize,
    /// Messages whose source string is not part of the project.
    pub unknown: usize,
    /// Messages without any translated text.
    pub skipped: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn package_report_counts_written_files() {
        let r = PackageReport {
            schema_version: SCHEMA_VERSION,
            release_id: 1,
            release: "9.1.0".into(),
            project: "drupal".into(),
            languages: vec![
                PackagedLanguage {
                    language: "de".into(),
                    path: Some("all/drupal/drupal-9.1.0.de.po".into()),
                    strings: Some(3),
                },
                PackagedLanguage {
                    language: "fr".into(),
                    path: None,
                    strings: None,
                },
            ],
            checked: None,
            updated: None,
        };
        assert_eq!(r.files_written(), 1);
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["languages"][1]["path"], serde_json::Value::Null);
    }
}
