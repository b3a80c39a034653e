use std::fs;

pub fn run_schema(out_dir: std::path::PathBuf) -> color_eyre::Result<()> {
    fs::create_dir_all(&out_dir)?;
    macro_rules! dump {
        ($ty:ty, $name:literal) => {{
            let schema = schemars::schema_for!($ty);
            let path = out_dir.join($name);
            let f = std::fs::File::create(&path)?;
            serde_json::to_writer_pretty(f, &schema)?;
        }};
    }
    dump!(l10n_domain::ExportReport, "export_report.schema.json");
    dump!(l10n_domain::PackageReport, "package_report.schema.json");
    dump!(l10n_domain::QueueSummary, "queue_summary.schema.json");
    dump!(l10n_domain::ImportSummary, "import_summary.schema.json");
    dump!(l10n_domain::ReleaseCandidate, "release_candidate.schema.json");
    dump!(l10n_store::Snapshot, "snapshot.schema.json");
    crate::ui_ok!("schemas written to {}", out_dir.display());
    Ok(())
}
