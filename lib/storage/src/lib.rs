pub mod index;
pub mod snapshot;

pub use index::{DescriptorIndex, IndexStats};
pub use snapshot::{read_snapshot, write_snapshot, Snapshot, SnapshotEntry, SNAPSHOT_VERSION};
