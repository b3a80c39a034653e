use std::io::Write;
use std::path::PathBuf;

use color_eyre::eyre::Result;
use l10n_services::ExportArgs;

use crate::{commands::print_json, ui_ok, Ctx, OutputFormat};

pub struct ExportCmd {
    pub project: String,
    pub release: Option<String>,
    pub lang: Option<String>,
    pub template: bool,
    pub compact: bool,
    pub installer_only: bool,
    pub suggestions: bool,
    pub out: Option<PathBuf>,
    pub format: OutputFormat,
}

pub fn run_export(ctx: &Ctx, cmd: ExportCmd) -> Result<()> {
    let cfg = ctx.cfg.export.clone().unwrap_or_default();
    let out = cmd.out.or_else(|| cfg.out_dir.map(PathBuf::from));
    let args = ExportArgs {
        project: cmd.project,
        release: cmd.release,
        language: cmd.lang,
        template: cmd.template,
        compact: cmd.compact || cfg.compact.unwrap_or(false),
        installer_only: cmd.installer_only || cfg.installer_only.unwrap_or(false),
        include_suggestions: cmd.suggestions || cfg.include_suggestions.unwrap_or(false),
        out,
    };
    tracing::debug!(event = "export_args", ?args);

    let store = l10n_services::open_store(&ctx.data)?;
    let (report, body) = l10n_services::export_po(&store, ctx.clock.as_ref(), &args)?;

    if print_json(cmd.format, &report)? {
        return Ok(());
    }
    match report.path.as_deref() {
        Some(path) => ui_ok!("{} strings written to {path}", report.strings),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(body.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}
