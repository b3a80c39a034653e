use std::path::Path;

use color_eyre::eyre::Result;

use crate::{commands::print_json, ui_ok, Ctx, OutputFormat};

pub fn run_import_po(
    ctx: &Ctx,
    project: &str,
    lang: &str,
    po: &Path,
    format: OutputFormat,
) -> Result<()> {
    let store = l10n_services::open_store(&ctx.data)?;
    let summary =
        l10n_services::import_po_translations(&store, ctx.clock.as_ref(), project, lang, po)?;
    if print_json(format, &summary)? {
        return Ok(());
    }
    ui_ok!(
        "imported {}: {} added, {} updated, {} unchanged, {} suggestions, {} unknown, {} empty",
        po.display(),
        summary.added,
        summary.updated,
        summary.unchanged,
        summary.suggestions,
        summary.unknown,
        summary.skipped
    );
    Ok(())
}
