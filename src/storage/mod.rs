pub mod cached;
pub mod json_file;
pub mod memory;
pub mod trait_def;

pub use cached::CachedStore;
pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use trait_def::{LinkStore, StoreError, StoreResult};
