use l10n_core::{Project, Release};

pub const DEFAULT_FILEPATH: &str = "%core/%project/%project-%release.%language.po";

/// Name of the per-branch link, placed next to the packaged file.
pub const LATEST_FILENAME: &str = "%project-%branch.%language.po";

/// Artifact path template.
///
/// Tokens: `%project`, `%release`, `%core`, `%version`, `%extra` (`-{extra}`
/// or nothing), `%branch` and `%language` (empty without a language).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePattern(String);

impl Default for FilePattern {
    fn default() -> Self {
        Self(DEFAULT_FILEPATH.to_string())
    }
}

impl FilePattern {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self(pattern.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn render(&self, project: &Project, release: &Release, language: Option<&str>) -> String {
        let extra = release.extra().map(|e| format!("-{e}")).unwrap_or_default();
        self.0
            .replace("%project", &project.uri)
            .replace("%release", &release.title)
            .replace("%version", release.version())
            .replace("%language", language.unwrap_or(""))
            .replace("%branch", &release.branch())
            .replace("%extra", &extra)
            .replace("%core", release.core())
    }
}

/// `(link, target)` for the branch link of a file written at `path`.
/// The target is relative to the link's directory.
pub fn latest_link(path: &str, project: &Project, release: &Release, language: &str) -> (String, String) {
    let name = FilePattern::new(LATEST_FILENAME).render(project, release, Some(language));
    match path.rsplit_once('/') {
        Some((dir, file)) => (format!("{dir}/{name}"), file.to_string()),
        None => (name, path.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project() -> Project {
        Project {
            id: 1,
            uri: "views".into(),
            title: "Views".into(),
        }
    }

    fn release(title: &str) -> Release {
        Release {
            id: 4,
            project_id: 1,
            title: title.into(),
            download_link: None,
            file_date: None,
        }
    }

    #[test]
    fn default_pattern_uses_core_directory() {
        let p = FilePattern::default();
        assert_eq!(
            p.render(&project(), &release("9.1.0"), Some("fr")),
            "all/views/views-9.1.0.fr.po"
        );
        assert_eq!(
            p.render(&project(), &release("7.x-3.24"), Some("fr")),
            "7.x/views/views-7.x-3.24.fr.po"
        );
    }

    #[test]
    fn version_and_extra_tokens() {
        let p = FilePattern::new("%core/%project/%version%extra/%language.po");
        assert_eq!(
            p.render(&project(), &release("7.x-3.0-rc1"), Some("de")),
            "7.x/views/3.0-rc1/de.po"
        );
        assert_eq!(
            p.render(&project(), &release("8.2.0"), None),
            "all/views/8.2.0/.po"
        );
    }

    #[test]
    fn latest_link_sits_next_to_file() {
        let (link, target) = latest_link(
            "7.x/views/views-7.x-3.24.fr.po",
            &project(),
            &release("7.x-3.24"),
            "fr",
        );
        assert_eq!(link, "7.x/views/views-7.x-3.x.fr.po");
        assert_eq!(target, "views-7.x-3.24.fr.po");

        let (link, target) = latest_link("views-1.0.fr.po", &project(), &release("1.0"), "fr");
        assert_eq!(link, "views-1.x.fr.po");
        assert_eq!(target, "views-1.0.fr.po");
    }
}
