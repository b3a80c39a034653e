use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use color_eyre::eyre::{eyre, Result};
use l10n_services::SourceKind;

use crate::{commands::print_json, ui_ok, ui_out, Ctx, OutputFormat};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceArg {
    Filesystem,
    Upload,
    Restapi,
    Gettext,
}

fn source_kind(
    source: SourceArg,
    path: Option<PathBuf>,
    since: Option<DateTime<Utc>>,
) -> Result<SourceKind> {
    let need_path = |path: Option<PathBuf>| path.ok_or_else(|| eyre!("--path is required for this source"));
    Ok(match source {
        SourceArg::Filesystem => SourceKind::Filesystem {
            root: need_path(path)?,
        },
        SourceArg::Upload => SourceKind::Upload,
        SourceArg::Restapi => SourceKind::RestApi {
            feed: need_path(path)?,
            since,
        },
        SourceArg::Gettext => SourceKind::GettextUpload {
            po: need_path(path)?,
        },
    })
}

pub fn run_releases(
    ctx: &Ctx,
    source: SourceArg,
    path: Option<PathBuf>,
    since: Option<DateTime<Utc>>,
    register: bool,
    format: OutputFormat,
) -> Result<()> {
    let kind = source_kind(source, path, since)?;
    let candidates = kind.fetch_candidates()?;

    if register {
        let store = l10n_services::open_store(&ctx.data)?;
        let added = l10n_services::register_candidates(&store, &candidates)?;
        ui_ok!("{added} new releases registered from {}", kind.name());
    }
    if print_json(format, &candidates)? {
        return Ok(());
    }
    for c in &candidates {
        let date = c
            .file_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());
        ui_out!("{}\t{}\t{date}", c.project, c.version);
    }
    Ok(())
}
