use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "l10n.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct L10nConfig {
    /// Snapshot file holding projects, strings and translations.
    pub data: Option<String>,
    pub packager: Option<PackagerCfg>,
    pub export: Option<ExportCfg>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PackagerCfg {
    /// Root directory for packaged files.
    pub directory: Option<String>,
    /// Path pattern below `directory`.
    pub filepath: Option<String>,
    pub file_limit: Option<usize>,
    pub release_limit: Option<usize>,
    pub interval_secs: Option<u64>,
    pub link_latest: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ExportCfg {
    pub compact: Option<bool>,
    pub include_suggestions: Option<bool>,
    pub installer_only: Option<bool>,
    pub out_dir: Option<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Default search order: `./l10n.toml`, then `$CONFIG_DIR/l10n/l10n.toml`.
pub fn config_paths() -> Vec<PathBuf> {
    let mut out = Vec::new();
    if let Ok(p) = std::env::current_dir() {
        out.push(p.join(CONFIG_FILE));
    }
    if let Some(base) = dirs::config_dir() {
        out.push(base.join("l10n").join(CONFIG_FILE));
    }
    out
}

pub fn load_config() -> Result<L10nConfig, ConfigError> {
    load_config_from(&config_paths())
}

/// Merge the files that exist, earlier paths winning per field.
pub fn load_config_from(paths: &[PathBuf]) -> Result<L10nConfig, ConfigError> {
    let mut merged = L10nConfig::default();
    for path in paths {
        if let Some(cfg) = read_config(path)? {
            merged = merge(merged, cfg);
        }
    }
    Ok(merged)
}

fn read_config(path: &Path) -> Result<Option<L10nConfig>, ConfigError> {
    let s = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    toml::from_str::<L10nConfig>(&s)
        .map(Some)
        .map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

fn merge(mut a: L10nConfig, b: L10nConfig) -> L10nConfig {
    if a.data.is_none() {
        a.data = b.data;
    }
    a.packager = merge_opt(a.packager, b.packager, merge_packager);
    a.export = merge_opt(a.export, b.export, merge_export);
    a
}

fn merge_opt<T: Default>(a: Option<T>, b: Option<T>, f: fn(T, T) -> T) -> Option<T> {
    match (a, b) {
        (Some(a), Some(b)) => Some(f(a, b)),
        (None, Some(b)) => Some(b),
        (Some(a), None) => Some(a),
        (None, None) => None,
    }
}

fn merge_packager(mut a: PackagerCfg, b: PackagerCfg) -> PackagerCfg {
    if a.directory.is_none() {
        a.directory = b.directory;
    }
    if a.filepath.is_none() {
        a.filepath = b.filepath;
    }
    if a.file_limit.is_none() {
        a.file_limit = b.file_limit;
    }
    if a.release_limit.is_none() {
        a.release_limit = b.release_limit;
    }
    if a.interval_secs.is_none() {
        a.interval_secs = b.interval_secs;
    }
    if a.link_latest.is_none() {
        a.link_latest = b.link_latest;
    }
    a
}

fn merge_export(mut a: ExportCfg, b: ExportCfg) -> ExportCfg {
    if a.compact.is_none() {
        a.compact = b.compact;
    }
    if a.include_suggestions.is_none() {
        a.include_suggestions = b.include_suggestions;
    }
    if a.installer_only.is_none() {
        a.installer_only = b.installer_only;
    }
    if a.out_dir.is_none() {
        a.out_dir = b.out_dir;
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_file_wins_per_field() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("local.toml");
        let global = dir.path().join("global.toml");
        std::fs::write(
            &local,
            "data = \"local.json\"\n[packager]\nfile_limit = 50\n",
        )
        .unwrap();
        std::fs::write(
            &global,
            "data = \"global.json\"\n[packager]\nfile_limit = 5\ndirectory = \"/srv/files\"\n[export]\ncompact = true\n",
        )
        .unwrap();

        let cfg = load_config_from(&[local, global]).unwrap();
        assert_eq!(cfg.data.as_deref(), Some("local.json"));
        let packager = cfg.packager.unwrap();
        assert_eq!(packager.file_limit, Some(50));
        assert_eq!(packager.directory.as_deref(), Some("/srv/files"));
        assert_eq!(cfg.export.unwrap().compact, Some(true));
    }

    #[test]
    fn missing_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&[dir.path().join("none.toml")]).unwrap();
        assert_eq!(cfg, L10nConfig::default());
    }

    #[test]
    fn invalid_toml_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("l10n.toml");
        std::fs::write(&bad, "[packager\nfile_limit = ").unwrap();
        let err = load_config_from(&[bad]).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("l10n.toml"));
    }
}
