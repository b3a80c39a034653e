//! Package scheduling: which release/language files are stale, where they
//! go, and the bookkeeping that lets budgeted runs make forward progress.

mod path;
mod scheduler;

pub use path::{latest_link, FilePattern, DEFAULT_FILEPATH, LATEST_FILENAME};
pub use scheduler::{CheckOptions, PackageScheduler, PackagerSettings, QueueOptions};
