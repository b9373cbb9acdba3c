//! Persistence: storage transports, the versioned envelope and its
//! migration chain.

pub mod migration;
pub mod serializer;
pub mod storage;

pub use migration::{consolidate_legacy, migrate, CURRENT_VERSION};
pub use serializer::{deserialize, serialize, Decoded, SavedState};
pub use storage::{FileStorage, MemoryStorage, StorageAdapter};
