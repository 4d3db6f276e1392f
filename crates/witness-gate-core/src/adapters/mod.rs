//! # Infrastructure Adapters
//!
//! Implementations of the [`ContentStore`](crate::ContentStore) interface.

pub mod filesystem_store;
pub mod ipfs_http_store;
pub mod memory_store;

pub use filesystem_store::FilesystemContentStore;
pub use ipfs_http_store::IpfsHttpStore;
pub use memory_store::MemoryContentStore;
