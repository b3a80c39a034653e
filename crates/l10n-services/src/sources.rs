use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::{DateTime, TimeZone, Utc};
use color_eyre::eyre::WrapErr;
use l10n_domain::ReleaseCandidate;
use l10n_store::MemoryStore;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::Result;

/// Where release information comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    /// Release archives below a local directory.
    Filesystem { root: PathBuf },
    /// Releases are registered by hand; nothing to fetch.
    Upload,
    /// A downloaded CSV release feed: `project,version,download_link,file_date`.
    RestApi {
        feed: PathBuf,
        since: Option<DateTime<Utc>>,
    },
    /// A single uploaded `{project}-{version}.po` file.
    GettextUpload { po: PathBuf },
}

#[derive(Debug, Deserialize)]
struct FeedRow {
    project: String,
    version: String,
    #[serde(default)]
    download_link: Option<String>,
    /// Unix timestamp.
    #[serde(default)]
    file_date: Option<i64>,
}

fn archive_re() -> Result<&'static Regex> {
    static RE: OnceLock<Regex> = OnceLock::new();
    if let Some(re) = RE.get() {
        return Ok(re);
    }
    let re = Regex::new(r"^([a-z0-9_]+)-(.+?)\.(?:tar\.gz|tgz)$")?;
    Ok(RE.get_or_init(|| re))
}

fn po_name_re() -> Result<&'static Regex> {
    static RE: OnceLock<Regex> = OnceLock::new();
    if let Some(re) = RE.get() {
        return Ok(re);
    }
    let re = Regex::new(r"^([a-z0-9_]+)-(.+)\.po$")?;
    Ok(RE.get_or_init(|| re))
}

fn modified(path: &Path) -> Option<DateTime<Utc>> {
    let time = std::fs::metadata(path).ok()?.modified().ok()?;
    Some(DateTime::<Utc>::from(time))
}

impl SourceKind {
    pub fn name(&self) -> &'static str {
        match self {
            SourceKind::Filesystem { .. } => "filesystem",
            SourceKind::Upload => "upload",
            SourceKind::RestApi { .. } => "restapi",
            SourceKind::GettextUpload { .. } => "gettext",
        }
    }

    /// Releases this source knows about, sorted by project and version.
    pub fn fetch_candidates(&self) -> Result<Vec<ReleaseCandidate>> {
        let mut out = match self {
            SourceKind::Filesystem { root } => self.scan_archives(root)?,
            SourceKind::Upload => Vec::new(),
            SourceKind::RestApi { feed, since } => self.read_feed(feed, *since)?,
            SourceKind::GettextUpload { po } => self.from_po_name(po)?,
        };
        out.sort_by(|a, b| (&a.project, &a.version).cmp(&(&b.project, &b.version)));
        debug!(event = "candidates_fetched", source = self.name(), count = out.len());
        Ok(out)
    }

    fn scan_archives(&self, root: &Path) -> Result<Vec<ReleaseCandidate>> {
        let re = archive_re()?;
        let mut out = Vec::new();
        for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            let Some(caps) = re.captures(&name) else {
                continue;
            };
            out.push(ReleaseCandidate {
                source: self.name().to_string(),
                project: caps[1].to_string(),
                version: caps[2].to_string(),
                download_link: Some(entry.path().display().to_string()),
                file_date: modified(entry.path()),
            });
        }
        Ok(out)
    }

    fn read_feed(
        &self,
        feed: &Path,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<ReleaseCandidate>> {
        let mut rdr = csv::Reader::from_path(feed)
            .wrap_err_with(|| format!("cannot open release feed {}", feed.display()))?;
        let mut out = Vec::new();
        for row in rdr.deserialize::<FeedRow>() {
            let row = row.wrap_err_with(|| format!("invalid row in {}", feed.display()))?;
            let file_date = row
                .file_date
                .and_then(|ts| Utc.timestamp_opt(ts, 0).single());
            // feeds are not guaranteed to be sorted, so every row is checked
            if let (Some(since), Some(date)) = (since, file_date) {
                if date < since {
                    continue;
                }
            }
            out.push(ReleaseCandidate {
                source: self.name().to_string(),
                project: row.project,
                version: row.version,
                download_link: row.download_link.filter(|l| !l.is_empty()),
                file_date,
            });
        }
        Ok(out)
    }

    fn from_po_name(&self, po: &Path) -> Result<Vec<ReleaseCandidate>> {
        let re = po_name_re()?;
        let name = po
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let Some(caps) = re.captures(&name) else {
            return Ok(Vec::new());
        };
        Ok(vec![ReleaseCandidate {
            source: self.name().to_string(),
            project: caps[1].to_string(),
            version: caps[2].to_string(),
            download_link: None,
            file_date: modified(po),
        }])
    }
}

/// Add unknown projects and releases to the store. Returns the number of new releases.
pub fn register_candidates(store: &MemoryStore, candidates: &[ReleaseCandidate]) -> Result<usize> {
    let added = store.update(|snap| {
        let mut added = 0usize;
        for c in candidates {
            let existing = snap.project_by_uri(&c.project).map(|p| p.id);
            let project_id = match existing {
                Some(id) => id,
                None => snap.add_project(&c.project, &c.project),
            };
            let exists = snap
                .releases
                .iter()
                .any(|r| r.project_id == project_id && r.title == c.version);
            if exists {
                continue;
            }
            let id = snap.add_release(project_id, &c.version);
            if let Some(r) = snap.releases.iter_mut().find(|r| r.id == id) {
                r.download_link = c.download_link.clone();
                r.file_date = c.file_date;
            }
            added += 1;
        }
        added
    })?;
    store.save()?;
    info!(event = "releases_registered", candidates = candidates.len(), added);
    Ok(added)
}
