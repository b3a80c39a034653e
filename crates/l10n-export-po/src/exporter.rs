use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Datelike, Utc};
use l10n_core::{
    Clock, ExportError, ExportRow, ExportScope, Language, OccurrenceType, PluralText, Project,
    Release, TranslationRepository, TranslationRow,
};
use tracing::debug;

use crate::format::{escape_po, po_date, po_quoted, REVISION_DATE_PLACEHOLDER};

pub const PO_MIME: &str = "text/x-gettext-translation";
pub const POT_MIME: &str = "text/x-gettext-translation-template";

/// Parameters of one export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    pub project_uri: String,
    pub release_id: Option<u64>,
    pub language: Option<String>,
    pub template: bool,
    pub compact: bool,
    pub installer_only: bool,
    pub include_suggestions: bool,
}

impl ExportRequest {
    /// A POT template, optionally tailored to a language's plural forms.
    pub fn template(project_uri: impl Into<String>) -> Self {
        Self {
            project_uri: project_uri.into(),
            release_id: None,
            language: None,
            template: true,
            compact: false,
            installer_only: false,
            include_suggestions: false,
        }
    }

    /// A PO file carrying the translations of one language.
    pub fn translations(project_uri: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            language: Some(language.into()),
            template: false,
            ..Self::template(project_uri)
        }
    }

    pub fn release(mut self, release_id: u64) -> Self {
        self.release_id = Some(release_id);
        self
    }

    pub fn language(mut self, code: impl Into<String>) -> Self {
        self.language = Some(code.into());
        self
    }

    pub fn compact(mut self, compact: bool) -> Self {
        self.compact = compact;
        self
    }

    pub fn installer_only(mut self, installer_only: bool) -> Self {
        self.installer_only = installer_only;
        self
    }

    pub fn suggestions(mut self, include: bool) -> Self {
        self.include_suggestions = include;
        self
    }
}

/// Result of a successful export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoExport {
    pub mime_type: &'static str,
    pub body: String,
    pub filename: String,
    /// Number of distinct source strings written.
    pub sid_count: usize,
    /// Newest `time_changed` among exported translations.
    pub revision: Option<DateTime<Utc>>,
}

/// Everything collected for one source string across the joined rows.
#[derive(Debug)]
struct StringGroup {
    value: PluralText,
    context: String,
    locations: BTreeMap<String, BTreeSet<u32>>,
    revisions: BTreeSet<(String, String)>,
    kind: OccurrenceType,
    candidates: Vec<TranslationRow>,
}

impl StringGroup {
    fn new(row: &ExportRow) -> Self {
        Self {
            value: row.value.clone(),
            context: row.context.clone(),
            locations: BTreeMap::new(),
            revisions: BTreeSet::new(),
            kind: row.kind,
            candidates: Vec::new(),
        }
    }

    fn absorb(&mut self, row: ExportRow) {
        self.locations
            .entry(row.file_path.clone())
            .or_default()
            .insert(row.lineno);
        self.revisions.insert((row.file_path, row.revision));
        self.kind = self.kind.merge(row.kind);
        if let Some(t) = row.translation {
            self.candidates.push(t);
        }
    }

    /// Pick the translation to emit and list pending suggestions.
    fn resolve(mut self, promote: bool) -> Entry {
        // join fan-out repeats each translation once per occurrence
        self.candidates.sort_by(|a, b| {
            (a.is_suggestion, Reverse(a.time_changed), a.text.to_raw()).cmp(&(
                b.is_suggestion,
                Reverse(b.time_changed),
                b.text.to_raw(),
            ))
        });
        self.candidates.dedup();

        let accepted = self.candidates.iter().find(|c| !c.is_suggestion).cloned();
        let suggestions: Vec<TranslationRow> = self
            .candidates
            .into_iter()
            .filter(|c| c.is_suggestion)
            .collect();

        let (translation, fuzzy) = match accepted {
            Some(t) => (Some(t), false),
            None if promote && !suggestions.is_empty() => (suggestions.first().cloned(), true),
            None => (None, false),
        };

        Entry {
            value: self.value,
            context: self.context,
            locations: self.locations,
            revisions: self.revisions,
            translation,
            fuzzy,
            suggestions: suggestions.into_iter().map(|s| s.text).collect(),
        }
    }
}

#[derive(Debug)]
struct Entry {
    value: PluralText,
    context: String,
    locations: BTreeMap<String, BTreeSet<u32>>,
    revisions: BTreeSet<(String, String)>,
    translation: Option<TranslationRow>,
    fuzzy: bool,
    suggestions: Vec<PluralText>,
}

impl Entry {
    fn has_translation(&self) -> bool {
        self.translation.as_ref().is_some_and(|t| !t.text.is_empty())
    }
}

/// Renders gettext PO/POT documents from repository data. Performs no writes.
pub struct PoExporter<'a> {
    repo: &'a dyn TranslationRepository,
    clock: &'a dyn Clock,
}

impl<'a> PoExporter<'a> {
    pub fn new(repo: &'a dyn TranslationRepository, clock: &'a dyn Clock) -> Self {
        Self { repo, clock }
    }

    pub fn export(&self, req: &ExportRequest) -> Result<PoExport, ExportError> {
        let project = self
            .repo
            .project_by_uri(&req.project_uri)?
            .ok_or_else(|| ExportError::ProjectNotFound(req.project_uri.clone()))?;

        let release = match req.release_id {
            Some(id) => Some(
                self.repo
                    .release(id)?
                    .filter(|r| r.project_id == project.id)
                    .ok_or(ExportError::ReleaseNotFound(id))?,
            ),
            None => None,
        };

        let language = match req.language.as_deref() {
            Some(code) => Some(
                self.repo
                    .language(code)?
                    .ok_or_else(|| ExportError::LanguageNotFound(code.to_string()))?,
            ),
            None => None,
        };
        if !req.template && language.is_none() {
            return Err(ExportError::LanguageRequired);
        }

        let with_suggestions = req.include_suggestions && !req.template;
        let scope = ExportScope {
            project_id: project.id,
            release_id: release.as_ref().map(|r| r.id),
            language: if req.template {
                None
            } else {
                language.as_ref().map(|l| l.code.as_str())
            },
            include_suggestions: with_suggestions,
        };
        let rows = self.repo.export_rows(&scope)?;
        debug!(event = "export_rows", project = %project.uri, rows = rows.len());

        // BTreeMap keyed by sid fixes the output order whatever the row order.
        let mut groups: BTreeMap<u64, StringGroup> = BTreeMap::new();
        for row in rows {
            groups
                .entry(row.sid)
                .or_insert_with(|| StringGroup::new(&row))
                .absorb(row);
        }

        let entries: Vec<Entry> = groups
            .into_values()
            .filter(|g| !req.installer_only || g.kind.is_installer())
            .map(|g| g.resolve(with_suggestions))
            .collect();
        if entries.is_empty() {
            return Err(ExportError::Empty);
        }

        let mut body_entries = String::new();
        let mut sid_count = 0usize;
        let mut revision: Option<DateTime<Utc>> = None;
        let mut revisions: BTreeSet<(String, String)> = BTreeSet::new();
        for entry in &entries {
            if req.compact && !req.template && !entry.has_translation() {
                continue;
            }
            if let Some(t) = entry.translation.as_ref().filter(|_| !req.template) {
                revision = revision.max(Some(t.time_changed));
            }
            revisions.extend(entry.revisions.iter().cloned());
            render_entry(&mut body_entries, entry, language.as_ref(), req);
            sid_count += 1;
        }
        if sid_count == 0 {
            return Err(ExportError::Empty);
        }

        let mut body = self.render_header(
            &project,
            release.as_ref(),
            language.as_ref(),
            req,
            revision,
            &revisions,
        );
        body.push_str(&body_entries);

        Ok(PoExport {
            mime_type: if req.template { POT_MIME } else { PO_MIME },
            body,
            filename: export_filename(
                &project,
                release.as_ref(),
                language.as_ref().map(|l| l.code.as_str()),
                req.template,
            ),
            sid_count,
            revision,
        })
    }

    fn render_header(
        &self,
        project: &Project,
        release: Option<&Release>,
        language: Option<&Language>,
        req: &ExportRequest,
        revision: Option<DateTime<Utc>>,
        revisions: &BTreeSet<(String, String)>,
    ) -> String {
        let now = self.clock.now();
        let team = language.map(|l| l.name.as_str()).unwrap_or("LANGUAGE");
        let release_label = release
            .map(|r| r.title.as_str())
            .unwrap_or("all releases");

        let mut h = String::new();
        h.push_str(&format!(
            "# {team} translation of {} ({release_label})\n",
            project.title
        ));
        h.push_str(&format!(
            "# Copyright (c) {} by the {team} translation team\n",
            now.year()
        ));
        if !req.compact && !revisions.is_empty() {
            h.push_str("# Generated from files:\n");
            for (path, rev) in revisions {
                if rev.is_empty() {
                    h.push_str(&format!("#  {path}\n"));
                } else {
                    h.push_str(&format!("#  {path}: {rev}\n"));
                }
            }
        }
        h.push_str("#\n");
        h.push_str("msgid \"\"\n");
        h.push_str("msgstr \"\"\n");
        h.push_str(&format!(
            "\"Project-Id-Version: {} ({release_label})\\n\"\n",
            escape_po(&project.title)
        ));
        h.push_str(&format!("\"POT-Creation-Date: {}\\n\"\n", po_date(now)));
        let revision_date = revision
            .map(po_date)
            .unwrap_or_else(|| REVISION_DATE_PLACEHOLDER.to_string());
        h.push_str(&format!("\"PO-Revision-Date: {revision_date}\\n\"\n"));
        h.push_str(&format!("\"Language-Team: {}\\n\"\n", escape_po(team)));
        h.push_str("\"MIME-Version: 1.0\\n\"\n");
        h.push_str("\"Content-Type: text/plain; charset=utf-8\\n\"\n");
        h.push_str("\"Content-Transfer-Encoding: 8bit\\n\"\n");
        let plural_forms = language
            .and_then(Language::plural_forms)
            .unwrap_or_else(|| "nplurals=INTEGER; plural=EXPRESSION;".to_string());
        h.push_str(&format!("\"Plural-Forms: {plural_forms}\\n\"\n"));
        h.push('\n');
        h
    }
}

fn render_entry(out: &mut String, entry: &Entry, language: Option<&Language>, req: &ExportRequest) {
    if !req.compact && !entry.locations.is_empty() {
        let refs: Vec<String> = entry
            .locations
            .iter()
            .map(|(path, lines)| {
                let lines: Vec<String> = lines.iter().map(u32::to_string).collect();
                format!("{path}:{}", lines.join(","))
            })
            .collect();
        out.push_str("#: ");
        out.push_str(&refs.join("; "));
        out.push('\n');
    }
    for s in &entry.suggestions {
        out.push_str("# suggestion: ");
        out.push_str(&escape_po(&s.to_raw()));
        out.push('\n');
    }
    if entry.fuzzy {
        out.push_str("#, fuzzy\n");
    }
    if !entry.context.is_empty() {
        out.push_str("msgctxt ");
        out.push_str(&po_quoted(&entry.context));
    }

    let translation = entry
        .translation
        .as_ref()
        .filter(|t| !req.template && !t.text.is_empty())
        .map(|t| &t.text);

    match entry.value.plural_form() {
        Some(plural) => {
            out.push_str("msgid ");
            out.push_str(&po_quoted(entry.value.singular()));
            out.push_str("msgid_plural ");
            out.push_str(&po_quoted(plural));
            match translation {
                Some(text) => {
                    for (i, v) in text.variants().iter().enumerate() {
                        out.push_str(&format!("msgstr[{i}] "));
                        out.push_str(&po_quoted(v));
                    }
                }
                None => {
                    let n = language.map(Language::plural_count).unwrap_or(2);
                    for i in 0..n {
                        out.push_str(&format!("msgstr[{i}] \"\"\n"));
                    }
                }
            }
        }
        None => {
            out.push_str("msgid ");
            out.push_str(&po_quoted(entry.value.singular()));
            out.push_str("msgstr ");
            out.push_str(&po_quoted(translation.map(|t| t.singular()).unwrap_or("")));
        }
    }
    if !req.compact {
        out.push('\n');
    }
}

/// `{project}-{release|all}[.{language}].{pot|po}`
pub fn export_filename(
    project: &Project,
    release: Option<&Release>,
    language: Option<&str>,
    template: bool,
) -> String {
    let release = release.map(|r| r.title.as_str()).unwrap_or("all");
    let language = language.map(|l| format!(".{l}")).unwrap_or_default();
    let ext = if template { "pot" } else { "po" };
    format!("{}-{release}{language}.{ext}", project.uri)
}
