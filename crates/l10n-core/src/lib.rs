//! Shared data model, error taxonomy and collaborator traits.

mod clock;
mod error;
mod model;
mod plural;
mod repository;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ExportError, FileStoreError, PackageError, RepositoryError};
pub use model::{
    Language, Line, OccurrenceType, PackageRecord, PackageStatus, PackagedFile, Project, Release,
    SourceString, Translation, CORE_ALL,
};
pub use plural::{PluralText, PLURAL_SEPARATOR};
pub use repository::{
    ExportRow, ExportScope, FileStore, PackageStore, TranslationRepository, TranslationRow,
};

/// Workspace-wide result alias for application code.
pub type Result<T> = color_eyre::eyre::Result<T>;
