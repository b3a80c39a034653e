use chrono::{DateTime, Utc};
use l10n_core::{
    Language, Line, OccurrenceType, PackageRecord, PackagedFile, PluralText, Project, Release,
    SourceString, Translation,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Everything the packager reads and writes, as one serializable document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Snapshot {
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub releases: Vec<Release>,
    #[serde(default)]
    pub languages: Vec<Language>,
    #[serde(default)]
    pub strings: Vec<SourceString>,
    #[serde(default)]
    pub lines: Vec<Line>,
    #[serde(default)]
    pub translations: Vec<Translation>,
    #[serde(default)]
    pub packages: Vec<PackageRecord>,
    #[serde(default)]
    pub files: Vec<PackagedFile>,
}

impl Snapshot {
    pub fn add_project(&mut self, uri: &str, title: &str) -> u64 {
        let id = self.projects.iter().map(|p| p.id).max().unwrap_or(0) + 1;
        self.projects.push(Project {
            id,
            uri: uri.to_string(),
            title: title.to_string(),
        });
        id
    }

    pub fn add_release(&mut self, project_id: u64, title: &str) -> u64 {
        let id = self.releases.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        self.releases.push(Release {
            id,
            project_id,
            title: title.to_string(),
            download_link: None,
            file_date: None,
        });
        id
    }

    pub fn add_language(&mut self, code: &str, name: &str, plurals: u32, formula: &str) {
        self.languages.retain(|l| l.code != code);
        self.languages.push(Language {
            code: code.to_string(),
            name: name.to_string(),
            plurals,
            formula: formula.to_string(),
        });
    }

    /// Register a source string; an existing `(value, context)` pair is reused.
    pub fn add_string(&mut self, value: impl Into<PluralText>, context: &str) -> u64 {
        let value = value.into();
        let key = SourceString::hash_key_for(&value, context);
        if let Some(s) = self.strings.iter().find(|s| s.hash_key == key) {
            return s.id;
        }
        let id = self.strings.iter().map(|s| s.id).max().unwrap_or(0) + 1;
        self.strings.push(SourceString::new(id, value, context));
        id
    }

    pub fn add_line(
        &mut self,
        sid: u64,
        release_id: u64,
        file_path: &str,
        lineno: u32,
        kind: OccurrenceType,
    ) {
        self.lines.push(Line {
            sid,
            release_id,
            file_path: file_path.to_string(),
            revision: String::new(),
            lineno,
            kind,
        });
    }

    /// Add an active translation or suggestion. A new accepted translation
    /// retires the previous one for the same string and language.
    pub fn add_translation(
        &mut self,
        sid: u64,
        language: &str,
        text: impl Into<PluralText>,
        is_suggestion: bool,
        at: DateTime<Utc>,
    ) -> u64 {
        if !is_suggestion {
            for t in self
                .translations
                .iter_mut()
                .filter(|t| t.sid == sid && t.language == language && t.is_accepted())
            {
                t.is_active = false;
            }
        }
        let id = self.translations.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        self.translations.push(Translation {
            id,
            sid,
            language: language.to_string(),
            text: text.into(),
            is_suggestion,
            is_active: true,
            time_entered: at,
            time_changed: at,
            uid: 0,
        });
        id
    }

    pub fn project_by_uri(&self, uri: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.uri == uri)
    }

    pub fn find_string(&self, value: &PluralText, context: &str) -> Option<&SourceString> {
        let key = SourceString::hash_key_for(value, context);
        self.strings.iter().find(|s| s.hash_key == key)
    }

    pub fn accepted_translation(&self, sid: u64, language: &str) -> Option<&Translation> {
        self.translations
            .iter()
            .find(|t| t.sid == sid && t.language == language && t.is_accepted())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strings_are_deduplicated_by_value_and_context() {
        let mut s = Snapshot::default();
        let a = s.add_string("Save", "");
        let b = s.add_string("Save", "");
        let c = s.add_string("Save", "button");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(s.strings.len(), 2);
    }

    #[test]
    fn new_accepted_translation_retires_previous() {
        let mut s = Snapshot::default();
        let sid = s.add_string("Save", "");
        let t0 = Utc::now();
        s.add_translation(sid, "de", "Sichern", false, t0);
        s.add_translation(sid, "de", "Vorschlag", true, t0);
        s.add_translation(sid, "de", "Speichern", false, t0);
        let active: Vec<_> = s
            .translations
            .iter()
            .filter(|t| t.is_accepted())
            .map(|t| t.text.singular().to_string())
            .collect();
        assert_eq!(active, vec!["Speichern".to_string()]);
        assert!(s.translations.iter().any(|t| t.is_suggestion && t.is_active));
    }
}
