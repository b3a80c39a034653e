use thiserror::Error;

/// A storage read or write failed. Always fatal for the current operation.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct RepositoryError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl RepositoryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("project not found: {0}")]
    ProjectNotFound(String),
    #[error("release {0} not found in project")]
    ReleaseNotFound(u64),
    #[error("language not found: {0}")]
    LanguageNotFound(String),
    #[error("a language is required to export translations")]
    LanguageRequired,
    /// No strings in the requested scope. Not a fault: there is nothing to package.
    #[error("no strings to export")]
    Empty,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Writing, deleting or linking a generated artifact failed.
#[derive(Debug, Error)]
pub enum FileStoreError {
    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to delete {path}: {source}")]
    Delete {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to link {link} -> {target}: {source}")]
    Link {
        link: String,
        target: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum PackageError {
    #[error("release not found: {0}")]
    ReleaseNotFound(u64),
    #[error("project {project_id} of release {release_id} not found")]
    ProjectNotFound { release_id: u64, project_id: u64 },
    #[error("export failed: {0}")]
    Export(ExportError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<ExportError> for PackageError {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::Repository(e) => PackageError::Repository(e),
            other => PackageError::Export(other),
        }
    }
}
