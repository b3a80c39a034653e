use std::collections::BTreeSet;
use std::path::Path;

use color_eyre::eyre::eyre;
use l10n_core::{Clock, TranslationRepository};
use l10n_domain::ImportSummary;
use l10n_store::MemoryStore;
use tracing::{debug, info};

use crate::{find_project, Result};

/// Import the translations of a PO file for one project and language.
///
/// Fuzzy messages become suggestions. A non-fuzzy message replaces the
/// accepted translation when its text differs.
pub fn import_po_translations(
    store: &MemoryStore,
    clock: &dyn Clock,
    project: &str,
    language: &str,
    po: &Path,
) -> Result<ImportSummary> {
    let project = find_project(store, project)?;
    if store.language(language)?.is_none() {
        return Err(eyre!("language not found: {language}"));
    }
    let messages = l10n_import_po::read_po_file(po)?;
    let now = clock.now();

    let summary = store.update(|snap| {
        let releases: BTreeSet<u64> = snap
            .releases
            .iter()
            .filter(|r| r.project_id == project.id)
            .map(|r| r.id)
            .collect();
        let in_project: BTreeSet<u64> = snap
            .lines
            .iter()
            .filter(|l| releases.contains(&l.release_id))
            .map(|l| l.sid)
            .collect();

        let mut summary = ImportSummary::default();
        for msg in &messages {
            let context = msg.context.as_deref().unwrap_or("");
            let sid = match snap.find_string(&msg.source(), context).map(|s| s.id) {
                Some(id) if in_project.contains(&id) => id,
                _ => {
                    debug!(event = "po_unknown_string", msgid = %msg.msgid);
                    summary.unknown += 1;
                    continue;
                }
            };
            let text = msg.translation();
            if text.is_empty() {
                summary.skipped += 1;
                continue;
            }

            if msg.fuzzy {
                let known = snap.translations.iter().any(|t| {
                    t.sid == sid && t.language == language && t.is_active && t.text == text
                });
                if known {
                    summary.unchanged += 1;
                } else {
                    snap.add_translation(sid, language, text, true, now);
                    summary.suggestions += 1;
                }
                continue;
            }

            let same = snap
                .accepted_translation(sid, language)
                .map(|t| t.text == text);
            match same {
                Some(true) => summary.unchanged += 1,
                Some(false) => {
                    snap.add_translation(sid, language, text, false, now);
                    summary.updated += 1;
                }
                None => {
                    snap.add_translation(sid, language, text, false, now);
                    summary.added += 1;
                }
            }
        }
        summary
    })?;
    store.save()?;

    info!(
        event = "po_imported",
        project = %project.uri,
        language,
        added = summary.added,
        updated = summary.updated,
        suggestions = summary.suggestions,
        unknown = summary.unknown,
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use l10n_core::ManualClock;

    const PO: &str = r#"msgid ""
msgstr ""
"Language-Team: German\n"

msgid "Save"
msgstr "Speichern"

msgid "1 item"
msgid_plural "@count items"
msgstr[0] "1 Element"
msgstr[1] "@count Elemente"

#, fuzzy
msgctxt "Long month name"
msgid "May"
msgstr "Mai"

msgid "Unknown"
msgstr "Unbekannt"

msgid "Cancel"
msgstr ""
"#;

    fn import(store: &MemoryStore, text: &str) -> ImportSummary {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("drupal-9.1.0.de.po");
        std::fs::write(&path, text).unwrap();
        let clock = ManualClock::new(fixtures::t(500));
        import_po_translations(store, &clock, "drupal", "de", &path).unwrap()
    }

    #[test]
    fn imports_translations_and_suggestions() {
        let store = fixtures::store();
        let summary = import(&store, PO);
        assert_eq!(
            summary,
            ImportSummary {
                added: 1,
                updated: 0,
                unchanged: 1,
                suggestions: 1,
                unknown: 2,
                skipped: 0,
            }
        );
        let snap = store.snapshot().unwrap();
        let items = snap
            .find_string(&"1 item\0@count items".into(), "")
            .unwrap()
            .id;
        assert_eq!(
            snap.accepted_translation(items, "de").unwrap().text.to_raw(),
            "1 Element\0@count Elemente"
        );
        assert!(snap
            .translations
            .iter()
            .any(|t| t.is_suggestion && t.text.to_raw() == "Mai"));

        // a second import changes nothing
        let again = import(&store, PO);
        assert_eq!(again.added + again.updated + again.suggestions, 0);
        assert_eq!(again.unchanged, 3);
    }

    #[test]
    fn changed_text_replaces_accepted_translation() {
        let store = fixtures::store();
        let summary = import(&store, "msgid \"Save\"\nmsgstr \"Sichern\"\n");
        assert_eq!(summary.updated, 1);
        let snap = store.snapshot().unwrap();
        let save = snap.find_string(&"Save".into(), "").unwrap().id;
        assert_eq!(snap.accepted_translation(save, "de").unwrap().text.to_raw(), "Sichern");
        let active = snap
            .translations
            .iter()
            .filter(|t| t.sid == save && t.is_accepted())
            .count();
        assert_eq!(active, 1);
    }

    #[test]
    fn empty_messages_are_skipped() {
        let store = fixtures::store();
        let summary = import(&store, "msgid \"Save\"\nmsgstr \"\"\n");
        assert_eq!(summary.skipped, 1);
    }

    #[test]
    fn unknown_language_is_an_error() {
        let store = fixtures::store();
        let clock = ManualClock::new(fixtures::t(0));
        let err = import_po_translations(&store, &clock, "drupal", "xx", Path::new("none.po"))
            .unwrap_err();
        assert!(err.to_string().contains("xx"));
    }
}
