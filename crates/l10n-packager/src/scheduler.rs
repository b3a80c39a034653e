use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

use chrono::{DateTime, Duration, Utc};
use l10n_core::{
    Clock, ExportError, FileStore, Language, PackageError, PackageRecord, PackageStatus,
    PackageStore, PackagedFile, Release, TranslationRepository,
};
use l10n_domain::QueueSummary;
use l10n_export_po::{ExportRequest, PoExporter};
use tracing::{debug, info, warn};

use crate::path::{latest_link, FilePattern};

#[derive(Debug, Clone)]
pub struct PackagerSettings {
    pub filepath: FilePattern,
    pub link_latest: bool,
}

impl Default for PackagerSettings {
    fn default() -> Self {
        Self {
            filepath: FilePattern::default(),
            link_latest: true,
        }
    }
}

/// Options of one `check_release` call.
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// Rebuild files even when no translation changed.
    pub force: bool,
    /// Stop after this many files were written. `0` means no limit.
    pub file_limit: usize,
    /// Only consider this language.
    pub only_language: Option<String>,
    /// Part of a repeated batch run; enables the interruption guard.
    pub batch: bool,
}

#[derive(Debug, Clone)]
pub struct QueueOptions {
    /// Releases per run. `0` means no limit.
    pub release_limit: usize,
    /// Files per run, shared across releases. `0` means no limit.
    pub file_limit: usize,
    /// Minimum time between two checks of the same release.
    pub interval: Duration,
    pub force: bool,
}

impl Default for QueueOptions {
    fn default() -> Self {
        Self {
            release_limit: 0,
            file_limit: 0,
            interval: Duration::days(1),
            force: false,
        }
    }
}

/// Decides which packages are stale and regenerates them.
pub struct PackageScheduler<'a> {
    repo: &'a dyn TranslationRepository,
    store: &'a dyn PackageStore,
    files: &'a dyn FileStore,
    clock: &'a dyn Clock,
    settings: PackagerSettings,
}

impl<'a> PackageScheduler<'a> {
    pub fn new(
        repo: &'a dyn TranslationRepository,
        store: &'a dyn PackageStore,
        files: &'a dyn FileStore,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            repo,
            store,
            files,
            clock,
            settings: PackagerSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: PackagerSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &PackagerSettings {
        &self.settings
    }

    /// Regenerate the stale language files of one release.
    ///
    /// Languages that were processed map to the file written for them, or to
    /// `None` when there was nothing to export or the write failed. Languages
    /// that needed no work, or were cut off by `file_limit`, are absent.
    pub fn check_release(
        &self,
        release_id: u64,
        opts: &CheckOptions,
    ) -> Result<BTreeMap<String, Option<PackagedFile>>, PackageError> {
        let started = Instant::now();
        let now = self.clock.now();
        let release = self
            .repo
            .release(release_id)?
            .ok_or(PackageError::ReleaseNotFound(release_id))?;
        let project = self
            .repo
            .project(release.project_id)?
            .ok_or(PackageError::ProjectNotFound {
                release_id,
                project_id: release.project_id,
            })?;
        let mut record = self
            .store
            .package_record(release_id)?
            .unwrap_or_else(|| PackageRecord::new(release_id));

        let mut languages: Vec<Language> = self
            .repo
            .languages()?
            .into_iter()
            .filter(|l| opts.only_language.as_deref().map_or(true, |c| l.code == c))
            .collect();
        languages.sort_by(|a, b| a.code.cmp(&b.code));

        let updates = self.repo.last_translation_updates(release_id)?;
        let guard = opts.force && opts.batch && record.is_interrupted();

        let mut queue: Vec<(String, Option<PackagedFile>)> = Vec::new();
        for lang in languages {
            let Some(update) = updates.get(&lang.code) else {
                continue;
            };
            let existing = self.store.packaged_file(release_id, &lang.code)?;
            let stale = opts.force
                || existing.as_ref().map_or(true, |f| *update > f.checked_at);
            if !stale {
                continue;
            }
            // files from the unfinished pass are already current
            if guard
                && existing
                    .as_ref()
                    .is_some_and(|f| Some(f.checked_at) > record.checked)
            {
                debug!(event = "package_skip_interrupted", release = %release.title, language = %lang.code);
                continue;
            }
            queue.push((lang.code, existing));
        }

        let link_latest =
            self.settings.link_latest && !queue.is_empty() && self.is_latest_in_branch(&release)?;
        let exporter = PoExporter::new(self.repo, self.clock);
        let mut results = BTreeMap::new();
        let mut written = 0usize;
        let mut write_failed = false;
        let mut drained = true;
        for (code, existing) in &queue {
            if opts.file_limit > 0 && written >= opts.file_limit {
                drained = false;
                break;
            }
            let req = ExportRequest::translations(project.uri.clone(), code.clone())
                .release(release.id)
                .compact(true);
            let export = match exporter.export(&req) {
                Ok(export) => export,
                Err(ExportError::Empty) => {
                    results.insert(code.clone(), None);
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let path = self.settings.filepath.render(&project, &release, Some(code));
            if let Err(e) = self.files.write(&path, export.body.as_bytes()) {
                warn!(event = "package_write_failed", release = %release.title, language = %code, error = %e);
                write_failed = true;
                results.insert(code.clone(), None);
                continue;
            }

            let file = PackagedFile {
                release_id,
                language: code.clone(),
                path: path.clone(),
                sid_count: export.sid_count,
                checked_at: now,
            };
            self.store.save_packaged_file(&file)?;
            if let Some(old) = existing.as_ref().filter(|f| f.path != path) {
                if let Err(e) = self.files.delete(&old.path) {
                    warn!(event = "package_delete_failed", path = %old.path, error = %e);
                }
            }
            written += 1;
            debug!(event = "package_written", path = %path, strings = export.sid_count);

            if link_latest {
                let (link, target) = latest_link(&path, &project, &release, code);
                if let Err(e) = self.files.link_latest(&target, &link) {
                    warn!(event = "package_link_failed", link = %link, error = %e);
                }
            }
            results.insert(code.clone(), Some(file));
        }

        if drained {
            record.checked = Some(now);
        }
        if written > 0 {
            record.updated = Some(now);
        }
        if record.status != PackageStatus::Disabled {
            record.status = if write_failed {
                PackageStatus::Error
            } else {
                PackageStatus::Active
            };
        }
        self.store.save_package_record(&record)?;

        info!(
            event = "release_checked",
            project = %project.uri,
            release = %release.title,
            checked = queue.len(),
            updated = written,
            complete = drained,
            elapsed_ms = started.elapsed().as_millis() as u64,
        );
        Ok(results)
    }

    /// Check the releases that are due, oldest first, under a shared file budget.
    pub fn run_queue(&self, opts: &QueueOptions) -> Result<QueueSummary, PackageError> {
        let started = Instant::now();
        let now = self.clock.now();
        let records: HashMap<u64, PackageRecord> = self
            .store
            .package_records()?
            .into_iter()
            .map(|r| (r.release_id, r))
            .collect();

        let cutoff = now - opts.interval;
        let mut due: Vec<(Option<DateTime<Utc>>, u64)> = self
            .repo
            .releases(None)?
            .into_iter()
            .filter_map(|r| {
                let rec = records.get(&r.id);
                if rec.is_some_and(|rec| rec.status == PackageStatus::Disabled) {
                    return None;
                }
                let checked = rec.and_then(|rec| rec.checked);
                match checked {
                    Some(at) if at >= cutoff => None,
                    _ => Some((checked, r.id)),
                }
            })
            .collect();
        due.sort();
        if opts.release_limit > 0 {
            due.truncate(opts.release_limit);
        }

        let mut summary = QueueSummary::default();
        let mut remaining = opts.file_limit;
        for (_, release_id) in due {
            if opts.file_limit > 0 && remaining == 0 {
                break;
            }
            let results = self.check_release(
                release_id,
                &CheckOptions {
                    force: opts.force,
                    file_limit: remaining,
                    only_language: None,
                    batch: true,
                },
            )?;
            let files = results.values().filter(|f| f.is_some()).count();
            summary.releases_checked += 1;
            summary.files_updated += files;
            if opts.file_limit > 0 {
                remaining = remaining.saturating_sub(files);
            }
        }
        summary.elapsed_ms = started.elapsed().as_millis() as u64;

        info!(
            event = "queue_run",
            releases_checked = summary.releases_checked,
            files_updated = summary.files_updated,
            elapsed_ms = summary.elapsed_ms,
        );
        Ok(summary)
    }

    /// Newest release of its project branch, by file date then id.
    fn is_latest_in_branch(&self, release: &Release) -> Result<bool, PackageError> {
        let branch = release.branch();
        let newest = self
            .repo
            .releases(Some(release.project_id))?
            .into_iter()
            .filter(|r| r.branch() == branch)
            .max_by_key(|r| (r.file_date, r.id));
        Ok(newest.is_some_and(|r| r.id == release.id))
    }
}
