use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use l10n_core::{
    ExportRow, ExportScope, Language, PackageRecord, PackageStore, PackagedFile, Project, Release,
    RepositoryError, Translation, TranslationRepository, TranslationRow,
};
use tracing::debug;

use crate::Snapshot;

/// Repository and package store backed by an in-memory [`Snapshot`],
/// optionally loaded from and saved to a JSON file.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Snapshot>,
    path: Option<PathBuf>,
}

impl MemoryStore {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            inner: RwLock::new(snapshot),
            path: None,
        }
    }

    /// Load a snapshot file. A missing file starts an empty store bound to that path.
    pub fn open(path: &Path) -> Result<Self, RepositoryError> {
        let snapshot = match std::fs::read_to_string(path) {
            Ok(s) => serde_json::from_str::<Snapshot>(&s).map_err(|e| {
                RepositoryError::with_source(format!("invalid snapshot {}", path.display()), e)
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Snapshot::default(),
            Err(e) => {
                return Err(RepositoryError::with_source(
                    format!("cannot read {}", path.display()),
                    e,
                ))
            }
        };
        debug!(event = "snapshot_loaded", path = %path.display(), strings = snapshot.strings.len());
        Ok(Self {
            inner: RwLock::new(snapshot),
            path: Some(path.to_path_buf()),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Write the snapshot back to the file it was opened from.
    pub fn save(&self) -> Result<(), RepositoryError> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };
        self.save_to(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), RepositoryError> {
        let json = {
            let snap = self.read()?;
            serde_json::to_string_pretty(&*snap)
                .map_err(|e| RepositoryError::with_source("cannot serialize snapshot", e))?
        };
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let io_err = |e: std::io::Error| {
            RepositoryError::with_source(format!("cannot write {}", path.display()), e)
        };
        std::fs::create_dir_all(&dir).map_err(io_err)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(io_err)?;
        tmp.write_all(json.as_bytes()).map_err(io_err)?;
        tmp.persist(path).map_err(|e| io_err(e.error))?;
        Ok(())
    }

    pub fn snapshot(&self) -> Result<Snapshot, RepositoryError> {
        Ok(self.read()?.clone())
    }

    /// Mutate the snapshot under the write lock.
    pub fn update<R>(&self, f: impl FnOnce(&mut Snapshot) -> R) -> Result<R, RepositoryError> {
        let mut snap = self.write()?;
        Ok(f(&mut snap))
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Snapshot>, RepositoryError> {
        self.inner
            .read()
            .map_err(|_| RepositoryError::new("snapshot lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Snapshot>, RepositoryError> {
        self.inner
            .write()
            .map_err(|_| RepositoryError::new("snapshot lock poisoned"))
    }
}

impl TranslationRepository for MemoryStore {
    fn project_by_uri(&self, uri: &str) -> Result<Option<Project>, RepositoryError> {
        Ok(self.read()?.project_by_uri(uri).cloned())
    }

    fn project(&self, id: u64) -> Result<Option<Project>, RepositoryError> {
        Ok(self.read()?.projects.iter().find(|p| p.id == id).cloned())
    }

    fn release(&self, id: u64) -> Result<Option<Release>, RepositoryError> {
        Ok(self.read()?.releases.iter().find(|r| r.id == id).cloned())
    }

    fn releases(&self, project_id: Option<u64>) -> Result<Vec<Release>, RepositoryError> {
        let snap = self.read()?;
        let mut out: Vec<Release> = snap
            .releases
            .iter()
            .filter(|r| project_id.map_or(true, |p| r.project_id == p))
            .cloned()
            .collect();
        out.sort_by_key(|r| r.id);
        Ok(out)
    }

    fn language(&self, code: &str) -> Result<Option<Language>, RepositoryError> {
        Ok(self.read()?.languages.iter().find(|l| l.code == code).cloned())
    }

    fn languages(&self) -> Result<Vec<Language>, RepositoryError> {
        let mut out = self.read()?.languages.clone();
        out.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(out)
    }

    fn export_rows(&self, scope: &ExportScope<'_>) -> Result<Vec<ExportRow>, RepositoryError> {
        let snap = self.read()?;
        let release_ids: BTreeSet<u64> = snap
            .releases
            .iter()
            .filter(|r| r.project_id == scope.project_id)
            .filter(|r| scope.release_id.map_or(true, |id| r.id == id))
            .map(|r| r.id)
            .collect();
        let strings: HashMap<u64, _> = snap.strings.iter().map(|s| (s.id, s)).collect();

        let mut by_sid: HashMap<u64, Vec<&Translation>> = HashMap::new();
        if let Some(lang) = scope.language {
            for t in snap.translations.iter().filter(|t| {
                t.language == lang && t.is_active && (!t.is_suggestion || scope.include_suggestions)
            }) {
                by_sid.entry(t.sid).or_default().push(t);
            }
        }

        let mut rows = Vec::new();
        for line in snap.lines.iter().filter(|l| release_ids.contains(&l.release_id)) {
            let Some(s) = strings.get(&line.sid) else {
                continue;
            };
            let row = |translation: Option<TranslationRow>| ExportRow {
                sid: s.id,
                value: s.value.clone(),
                context: s.context.clone(),
                file_path: line.file_path.clone(),
                revision: line.revision.clone(),
                lineno: line.lineno,
                kind: line.kind,
                translation,
            };
            match by_sid.get(&s.id) {
                Some(ts) if !ts.is_empty() => {
                    for t in ts {
                        rows.push(row(Some(TranslationRow {
                            text: t.text.clone(),
                            is_suggestion: t.is_suggestion,
                            time_changed: t.time_changed,
                        })));
                    }
                }
                _ => rows.push(row(None)),
            }
        }

        rows.sort_by(|a, b| {
            let key = |r: &ExportRow| {
                r.translation
                    .as_ref()
                    .map(|t| (t.is_suggestion, std::cmp::Reverse(t.time_changed)))
            };
            a.sid.cmp(&b.sid).then_with(|| key(a).cmp(&key(b)))
        });
        Ok(rows)
    }

    fn last_translation_updates(
        &self,
        release_id: u64,
    ) -> Result<BTreeMap<String, DateTime<Utc>>, RepositoryError> {
        let snap = self.read()?;
        let sids: BTreeSet<u64> = snap
            .lines
            .iter()
            .filter(|l| l.release_id == release_id)
            .map(|l| l.sid)
            .collect();
        let mut out: BTreeMap<String, DateTime<Utc>> = BTreeMap::new();
        for t in snap
            .translations
            .iter()
            .filter(|t| t.is_accepted() && sids.contains(&t.sid))
        {
            let e = out.entry(t.language.clone()).or_insert(t.time_changed);
            if t.time_changed > *e {
                *e = t.time_changed;
            }
        }
        Ok(out)
    }
}

impl PackageStore for MemoryStore {
    fn package_record(&self, release_id: u64) -> Result<Option<PackageRecord>, RepositoryError> {
        Ok(self
            .read()?
            .packages
            .iter()
            .find(|p| p.release_id == release_id)
            .cloned())
    }

    fn package_records(&self) -> Result<Vec<PackageRecord>, RepositoryError> {
        Ok(self.read()?.packages.clone())
    }

    fn save_package_record(&self, record: &PackageRecord) -> Result<(), RepositoryError> {
        let mut snap = self.write()?;
        match snap
            .packages
            .iter_mut()
            .find(|p| p.release_id == record.release_id)
        {
            Some(p) => *p = record.clone(),
            None => snap.packages.push(record.clone()),
        }
        Ok(())
    }

    fn packaged_file(
        &self,
        release_id: u64,
        language: &str,
    ) -> Result<Option<PackagedFile>, RepositoryError> {
        Ok(self
            .read()?
            .files
            .iter()
            .find(|f| f.release_id == release_id && f.language == language)
            .cloned())
    }

    fn save_packaged_file(&self, file: &PackagedFile) -> Result<(), RepositoryError> {
        let mut snap = self.write()?;
        match snap
            .files
            .iter_mut()
            .find(|f| f.release_id == file.release_id && f.language == file.language)
        {
            Some(f) => *f = file.clone(),
            None => snap.files.push(file.clone()),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use l10n_core::OccurrenceType;

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(secs)
    }

    fn sample() -> (MemoryStore, u64) {
        let mut s = Snapshot::default();
        let p = s.add_project("drupal", "Drupal core");
        let r1 = s.add_release(p, "9.1.0");
        let r2 = s.add_release(p, "9.2.0");
        let a = s.add_string("Save", "");
        let b = s.add_string("Cancel", "");
        s.add_line(b, r1, "core/a.php", 3, OccurrenceType::Runtime);
        s.add_line(a, r1, "core/a.php", 7, OccurrenceType::Runtime);
        s.add_line(a, r2, "core/b.php", 1, OccurrenceType::Runtime);
        s.add_translation(a, "de", "Speichern", false, t(10));
        s.add_translation(a, "de", "Sichern", true, t(20));
        s.add_translation(b, "fr", "Annuler", false, t(30));
        (MemoryStore::new(s), r1)
    }

    #[test]
    fn export_rows_are_sorted_and_left_joined() {
        let (store, r1) = sample();
        let rows = store
            .export_rows(&ExportScope {
                project_id: 1,
                release_id: Some(r1),
                language: Some("de"),
                include_suggestions: true,
            })
            .unwrap();
        let sids: Vec<u64> = rows.iter().map(|r| r.sid).collect();
        assert_eq!(sids, vec![1, 1, 2]);
        assert!(!rows[0].translation.as_ref().unwrap().is_suggestion);
        assert!(rows[1].translation.as_ref().unwrap().is_suggestion);
        assert!(rows[2].translation.is_none());
    }

    #[test]
    fn last_updates_only_count_accepted_translations_in_release() {
        let (store, r1) = sample();
        let updates = store.last_translation_updates(r1).unwrap();
        assert_eq!(updates.get("de"), Some(&t(10)));
        assert_eq!(updates.get("fr"), Some(&t(30)));
        let updates = store.last_translation_updates(2).unwrap();
        assert!(!updates.contains_key("fr"));
    }

    #[test]
    fn snapshot_survives_save_and_open() {
        let (store, _) = sample();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("l10n.json");
        store.save_to(&path).unwrap();
        let reopened = MemoryStore::open(&path).unwrap();
        assert_eq!(reopened.snapshot().unwrap(), store.snapshot().unwrap());

        let missing = MemoryStore::open(&dir.path().join("none.json")).unwrap();
        assert!(missing.snapshot().unwrap().projects.is_empty());
    }
}
