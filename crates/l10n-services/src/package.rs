use color_eyre::eyre::WrapErr;
use l10n_core::{Clock, FileStore, PackageStore};
use l10n_domain::{PackageReport, PackagedLanguage, QueueSummary, SCHEMA_VERSION};
use l10n_packager::{CheckOptions, PackageScheduler, PackagerSettings, QueueOptions};
use l10n_store::MemoryStore;

use crate::{find_project, find_release, Result};

/// Check one release and persist the bookkeeping.
pub fn package_release(
    store: &MemoryStore,
    files: &dyn FileStore,
    clock: &dyn Clock,
    settings: PackagerSettings,
    project: &str,
    release: &str,
    opts: &CheckOptions,
) -> Result<PackageReport> {
    let project = find_project(store, project)?;
    let release = find_release(store, &project, release)?;

    let scheduler = PackageScheduler::new(store, store, files, clock).with_settings(settings);
    let results = scheduler
        .check_release(release.id, opts)
        .wrap_err_with(|| format!("packaging {} {} failed", project.uri, release.title))?;
    store.save()?;

    let record = store.package_record(release.id)?;
    let languages = results
        .into_iter()
        .map(|(language, file)| PackagedLanguage {
            language,
            path: file.as_ref().map(|f| f.path.clone()),
            strings: file.map(|f| f.sid_count),
        })
        .collect();
    Ok(PackageReport {
        schema_version: SCHEMA_VERSION,
        release_id: release.id,
        release: release.title,
        project: project.uri,
        languages,
        checked: record.as_ref().and_then(|r| r.checked),
        updated: record.and_then(|r| r.updated),
    })
}

/// Run the release queue and persist the bookkeeping.
pub fn run_package_queue(
    store: &MemoryStore,
    files: &dyn FileStore,
    clock: &dyn Clock,
    settings: PackagerSettings,
    opts: &QueueOptions,
) -> Result<QueueSummary> {
    let scheduler = PackageScheduler::new(store, store, files, clock).with_settings(settings);
    let summary = scheduler.run_queue(opts)?;
    store.save()?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use l10n_core::ManualClock;
    use l10n_store::LocalFileStore;

    #[test]
    fn package_release_writes_files_and_saves_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("l10n.json");
        fixtures::store().save_to(&data).unwrap();
        let store = MemoryStore::open(&data).unwrap();
        let files = LocalFileStore::new(dir.path().join("files"));
        let clock = ManualClock::new(fixtures::t(60));

        let report = package_release(
            &store,
            &files,
            &clock,
            PackagerSettings::default(),
            "drupal",
            "9.1.0",
            &CheckOptions::default(),
        )
        .unwrap();
        assert_eq!(report.files_written(), 1);
        assert_eq!(report.languages[0].language, "de");
        assert_eq!(report.checked, Some(fixtures::t(60)));
        assert!(files.full_path("all/drupal/drupal-9.1.0.de.po").is_file());

        let reopened = MemoryStore::open(&data).unwrap();
        assert_eq!(reopened.snapshot().unwrap().files.len(), 1);
    }

    #[test]
    fn queue_run_reports_totals() {
        let dir = tempfile::tempdir().unwrap();
        let store = fixtures::store();
        let files = LocalFileStore::new(dir.path());
        let clock = ManualClock::new(fixtures::t(60));
        let summary = run_package_queue(
            &store,
            &files,
            &clock,
            PackagerSettings::default(),
            &QueueOptions::default(),
        )
        .unwrap();
        assert_eq!(summary.releases_checked, 1);
        assert_eq!(summary.files_updated, 1);
    }
}
