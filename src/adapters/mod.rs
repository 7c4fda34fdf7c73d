// Adapters layer: concrete storage behind the domain ports.

pub mod csv_export;
pub mod memory;
pub mod snapshot;

pub use memory::{MemoryStore, Tables};
pub use snapshot::SnapshotFile;
