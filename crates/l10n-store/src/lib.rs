//! Storage collaborators: a JSON snapshot repository and artifact file stores.

mod files;
mod memory;
mod snapshot;

pub use files::{LocalFileStore, MemoryFileStore};
pub use memory::MemoryStore;
pub use snapshot::Snapshot;
