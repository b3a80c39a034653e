use std::path::PathBuf;

use chrono::Duration;
use color_eyre::eyre::Result;
use l10n_packager::{CheckOptions, FilePattern, PackagerSettings, QueueOptions, DEFAULT_FILEPATH};
use l10n_store::LocalFileStore;
use owo_colors::OwoColorize;

use crate::{commands::print_json, ui_info, ui_ok, ui_out, ui_warn, Ctx, OutputFormat};

const DEFAULT_DIRECTORY: &str = "translations";
const DEFAULT_INTERVAL_SECS: u64 = 24 * 60 * 60;

pub struct PackageCmd {
    /// `(project, release)` for a single release; the queue otherwise.
    pub target: Option<(String, String)>,
    pub lang: Option<String>,
    pub force: bool,
    pub file_limit: Option<usize>,
    pub release_limit: Option<usize>,
    pub interval_secs: Option<u64>,
    pub directory: Option<PathBuf>,
    pub filepath: Option<String>,
    pub no_link: bool,
    pub format: OutputFormat,
}

pub fn run_package(ctx: &Ctx, cmd: PackageCmd) -> Result<()> {
    let cfg = ctx.cfg.packager.clone().unwrap_or_default();
    let directory = cmd
        .directory
        .or_else(|| cfg.directory.map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DIRECTORY));
    let settings = PackagerSettings {
        filepath: FilePattern::new(
            cmd.filepath
                .or(cfg.filepath)
                .unwrap_or_else(|| DEFAULT_FILEPATH.to_string()),
        ),
        link_latest: !cmd.no_link && cfg.link_latest.unwrap_or(true),
    };
    let file_limit = cmd.file_limit.or(cfg.file_limit).unwrap_or(0);

    let store = l10n_services::open_store(&ctx.data)?;
    let files = LocalFileStore::new(&directory);
    tracing::debug!(event = "package_args", directory = %directory.display(), filepath = settings.filepath.as_str(), file_limit);

    match cmd.target {
        Some((project, release)) => {
            let opts = CheckOptions {
                force: cmd.force,
                file_limit,
                only_language: cmd.lang,
                batch: false,
            };
            let report = l10n_services::package_release(
                &store,
                &files,
                ctx.clock.as_ref(),
                settings,
                &project,
                &release,
                &opts,
            )?;
            if print_json(cmd.format, &report)? {
                return Ok(());
            }
            for lang in &report.languages {
                match (&lang.path, lang.strings) {
                    (Some(path), Some(n)) => {
                        let code = if ctx.use_color {
                            lang.language.green().to_string()
                        } else {
                            lang.language.clone()
                        };
                        ui_out!("{code}\t{n}\t{path}");
                    }
                    _ => ui_warn!("{}: nothing written", lang.language),
                }
            }
            if report.languages.is_empty() {
                ui_info!("{} {} is up to date", report.project, report.release);
            } else {
                ui_ok!(
                    "{} of {} languages packaged for {} {}",
                    report.files_written(),
                    report.languages.len(),
                    report.project,
                    report.release
                );
            }
        }
        None => {
            let opts = QueueOptions {
                release_limit: cmd.release_limit.or(cfg.release_limit).unwrap_or(0),
                file_limit,
                interval: Duration::seconds(
                    cmd.interval_secs
                        .or(cfg.interval_secs)
                        .unwrap_or(DEFAULT_INTERVAL_SECS) as i64,
                ),
                force: cmd.force,
            };
            let summary = l10n_services::run_package_queue(
                &store,
                &files,
                ctx.clock.as_ref(),
                settings,
                &opts,
            )?;
            if print_json(cmd.format, &summary)? {
                return Ok(());
            }
            ui_ok!(
                "{} releases checked, {} files updated in {} ms",
                summary.releases_checked,
                summary.files_updated,
                summary.elapsed_ms
            );
        }
    }
    Ok(())
}
