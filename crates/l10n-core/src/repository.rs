use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::{
    FileStoreError, Language, OccurrenceType, PackageRecord, PackagedFile, PluralText, Project,
    Release, RepositoryError,
};

/// What the exporter asks the repository for.
#[derive(Debug, Clone, Copy)]
pub struct ExportScope<'a> {
    pub project_id: u64,
    /// `None` aggregates over every release of the project.
    pub release_id: Option<u64>,
    /// `None` skips the translation join entirely (templates).
    pub language: Option<&'a str>,
    /// Also join active suggestions, not only accepted translations.
    pub include_suggestions: bool,
}

/// A translation joined onto an export row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRow {
    pub text: PluralText,
    pub is_suggestion: bool,
    pub time_changed: DateTime<Utc>,
}

/// One (string, occurrence, translation?) tuple of the export query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRow {
    pub sid: u64,
    pub value: PluralText,
    pub context: String,
    pub file_path: String,
    pub revision: String,
    pub lineno: u32,
    pub kind: OccurrenceType,
    pub translation: Option<TranslationRow>,
}

/// Read-only view over strings, occurrences and translations.
pub trait TranslationRepository {
    fn project_by_uri(&self, uri: &str) -> Result<Option<Project>, RepositoryError>;
    fn project(&self, id: u64) -> Result<Option<Project>, RepositoryError>;
    fn release(&self, id: u64) -> Result<Option<Release>, RepositoryError>;
    /// Releases of one project, or of every project when `project_id` is `None`.
    fn releases(&self, project_id: Option<u64>) -> Result<Vec<Release>, RepositoryError>;
    fn language(&self, code: &str) -> Result<Option<Language>, RepositoryError>;
    fn languages(&self) -> Result<Vec<Language>, RepositoryError>;

    /// Rows ordered by sid ascending, then accepted before suggestions, then
    /// newest `time_changed` first. Strings without a matching translation
    /// still yield rows with `translation: None`.
    fn export_rows(&self, scope: &ExportScope<'_>) -> Result<Vec<ExportRow>, RepositoryError>;

    /// Per language, the newest `time_changed` of accepted translations of
    /// strings occurring in the release.
    fn last_translation_updates(
        &self,
        release_id: u64,
    ) -> Result<BTreeMap<String, DateTime<Utc>>, RepositoryError>;
}

/// Packaging bookkeeping, owned by the scheduler.
pub trait PackageStore {
    fn package_record(&self, release_id: u64) -> Result<Option<PackageRecord>, RepositoryError>;
    fn package_records(&self) -> Result<Vec<PackageRecord>, RepositoryError>;
    fn save_package_record(&self, record: &PackageRecord) -> Result<(), RepositoryError>;
    fn packaged_file(
        &self,
        release_id: u64,
        language: &str,
    ) -> Result<Option<PackagedFile>, RepositoryError>;
    fn save_packaged_file(&self, file: &PackagedFile) -> Result<(), RepositoryError>;
}

/// Destination for generated artifacts. Paths are relative to the store root.
pub trait FileStore {
    /// Replace the file at `path` as one unit; readers never see partial content.
    fn write(&self, path: &str, contents: &[u8]) -> Result<(), FileStoreError>;
    /// Remove `path`. Missing files are not an error.
    fn delete(&self, path: &str) -> Result<(), FileStoreError>;
    /// Point `link` at `target`, where `target` is relative to the link's directory.
    fn link_latest(&self, target: &str, link: &str) -> Result<(), FileStoreError>;
}
