//! Storage Module
//!
//! Key-addressed byte stores that encoded records are persisted to.
//!
//! ## Responsibilities
//! - Store whole buffers under string keys
//! - Refuse to clobber an existing key unless asked to
//! - Report missing keys as `NotFound`
//!
//! The codec never talks to storage directly; callers encode first, then hand
//! the finished buffer over, so a failed encode never reaches disk.
//!
//! ## Implementations
//! - [`MemoryStore`]: map behind a `RwLock`, for tests and scratch work
//! - [`FileStore`]: one file per key inside a directory

mod file;
mod memory;

use bytes::Bytes;

use crate::error::{MomemError, Result};

pub use file::FileStore;
pub use memory::MemoryStore;

/// A key-addressed byte store
///
/// Per-key atomicity is the implementation's concern; callers get no
/// cross-key guarantees.
pub trait Storage {
    /// Store `data` under `key`
    ///
    /// Fails with `AlreadyExists` if the key is taken and `overwrite` is false.
    fn put(&self, key: &str, data: &[u8], overwrite: bool) -> Result<()>;

    /// Fetch the bytes stored under `key`, or `NotFound`
    fn get(&self, key: &str) -> Result<Bytes>;

    /// Remove `key`, or `NotFound`
    fn delete(&self, key: &str) -> Result<()>;

    /// All keys, sorted
    fn list_keys(&self) -> Result<Vec<String>>;
}

/// Reject keys that cannot be used as a single file name
///
/// Shared by every store so that keys valid in memory stay valid on disk.
pub fn validate_key(key: &str) -> Result<()> {
    let bad = key.is_empty()
        || key == "."
        || key == ".."
        || key.contains(|c| c == '/' || c == '\\' || c == '\0');
    if bad {
        return Err(MomemError::InvalidKey(key.to_string()));
    }
    Ok(())
}
