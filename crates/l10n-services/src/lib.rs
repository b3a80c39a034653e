//! High-level orchestration layer over lower-level crates.
//! Exposes the entrypoints used by the CLI.

use std::path::{Path, PathBuf};

use color_eyre::eyre::{eyre, WrapErr};
use l10n_core::{Clock, Project, Release, TranslationRepository};
use l10n_domain::{ExportReport, SCHEMA_VERSION};
use l10n_export_po::{ExportRequest, PoExporter};
use l10n_store::MemoryStore;
use tracing::info;

pub use l10n_core::Result;

mod import;
mod package;
mod sources;

pub use import::import_po_translations;
pub use package::{package_release, run_package_queue};
pub use sources::{register_candidates, SourceKind};

/// Open the snapshot at `path`; a missing file yields an empty store.
pub fn open_store(path: &Path) -> Result<MemoryStore> {
    MemoryStore::open(path).wrap_err_with(|| format!("cannot open data file {}", path.display()))
}

pub(crate) fn find_project(repo: &dyn TranslationRepository, uri: &str) -> Result<Project> {
    repo.project_by_uri(uri)?
        .ok_or_else(|| eyre!("project not found: {uri}"))
}

pub(crate) fn find_release(
    repo: &dyn TranslationRepository,
    project: &Project,
    title: &str,
) -> Result<Release> {
    repo.releases(Some(project.id))?
        .into_iter()
        .find(|r| r.title == title)
        .ok_or_else(|| eyre!("release {title} not found in {}", project.uri))
}

#[derive(Debug, Clone, Default)]
pub struct ExportArgs {
    pub project: String,
    /// Release title; `None` exports every release of the project.
    pub release: Option<String>,
    pub language: Option<String>,
    pub template: bool,
    pub compact: bool,
    pub installer_only: bool,
    pub include_suggestions: bool,
    /// File or directory to write to; `None` returns the body only.
    pub out: Option<PathBuf>,
}

/// Export a PO/POT document, writing it to `args.out` when given.
pub fn export_po(
    repo: &dyn TranslationRepository,
    clock: &dyn Clock,
    args: &ExportArgs,
) -> Result<(ExportReport, String)> {
    let project = find_project(repo, &args.project)?;
    let release = match args.release.as_deref() {
        Some(title) => Some(find_release(repo, &project, title)?),
        None => None,
    };

    let mut req = if args.template {
        ExportRequest::template(project.uri.clone())
    } else {
        let lang = args
            .language
            .clone()
            .ok_or_else(|| eyre!("--lang is required unless exporting a template"))?;
        ExportRequest::translations(project.uri.clone(), lang)
    };
    if let (true, Some(lang)) = (args.template, args.language.as_deref()) {
        req = req.language(lang);
    }
    if let Some(r) = release.as_ref() {
        req = req.release(r.id);
    }
    let req = req
        .compact(args.compact)
        .installer_only(args.installer_only)
        .suggestions(args.include_suggestions);

    let export = PoExporter::new(repo, clock).export(&req)?;

    let path = match args.out.as_deref() {
        Some(out) => {
            let target = if out.is_dir() {
                out.join(&export.filename)
            } else {
                out.to_path_buf()
            };
            if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&target, &export.body)
                .wrap_err_with(|| format!("cannot write {}", target.display()))?;
            info!(event = "po_exported", path = %target.display(), strings = export.sid_count);
            Some(target.display().to_string())
        }
        None => None,
    };

    let report = ExportReport {
        schema_version: SCHEMA_VERSION,
        project: project.uri,
        release: release.map(|r| r.title),
        language: args.language.clone(),
        template: args.template,
        filename: export.filename,
        path,
        strings: export.sid_count,
    };
    Ok((report, export.body))
}


#[cfg(test)]
mod tests {
    use super::*;
    use l10n_core::ManualClock;

    #[test]
    fn export_writes_into_directory_with_default_name() {
        let store = fixtures::store();
        let clock = ManualClock::new(fixtures::t(60));
        let dir = tempfile::tempdir().unwrap();
        let (report, body) = export_po(
            &store,
            &clock,
            &ExportArgs {
                project: "drupal".into(),
                release: Some("9.1.0".into()),
                language: Some("de".into()),
                out: Some(dir.path().to_path_buf()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(report.filename, "drupal-9.1.0.de.po");
        assert_eq!(report.strings, 3);
        let written = std::fs::read_to_string(dir.path().join("drupal-9.1.0.de.po")).unwrap();
        assert_eq!(written, body);
    }

    #[test]
    fn export_template_needs_no_language() {
        let store = fixtures::store();
        let clock = ManualClock::new(fixtures::t(60));
        let (report, body) = export_po(
            &store,
            &clock,
            &ExportArgs {
                project: "drupal".into(),
                template: true,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(report.filename, "drupal-all.pot");
        assert!(report.path.is_none());
        assert!(!body.contains("Speichern"));
    }

    #[test]
    fn export_reports_unknown_release_and_missing_language() {
        let store = fixtures::store();
        let clock = ManualClock::new(fixtures::t(60));
        let err = export_po(
            &store,
            &clock,
            &ExportArgs {
                project: "drupal".into(),
                release: Some("10.0.0".into()),
                language: Some("de".into()),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("10.0.0"));

        let err = export_po(
            &store,
            &clock,
            &ExportArgs {
                project: "drupal".into(),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("--lang"));
    }
}
