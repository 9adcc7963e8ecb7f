//! Directory-backed store
//!
//! Each key is a file directly inside the store's directory.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tracing::debug;

use super::{validate_key, Storage};
use crate::error::{MomemError, Result};

/// Store with one file per key
pub struct FileStore {
    /// Directory holding one file per key
    dir: PathBuf,
}

impl FileStore {
    /// Open a store over `dir`, creating the directory if needed
    pub fn open(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn key_path(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(key))
    }
}

impl Storage for FileStore {
    fn put(&self, key: &str, data: &[u8], overwrite: bool) -> Result<()> {
        let path = self.key_path(key)?;

        let mut options = OpenOptions::new();
        options.write(true);
        if overwrite {
            options.create(true).truncate(true);
        } else {
            // Existence check and creation in one syscall
            options.create_new(true);
        }

        let mut file = options.open(&path).map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => MomemError::AlreadyExists(key.to_string()),
            _ => MomemError::Io(e),
        })?;
        file.write_all(data)?;
        file.sync_all()?;

        debug!(key, bytes = data.len(), "stored file");
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Bytes> {
        let path = self.key_path(key)?;
        match fs::read(&path) {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(MomemError::NotFound(key.to_string())),
            Err(e) => Err(MomemError::Io(e)),
        }
    }

    fn delete(&self, key: &str) -> Result<()> {
        let path = self.key_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(MomemError::NotFound(key.to_string())),
            Err(e) => Err(MomemError::Io(e)),
        }
    }

    fn list_keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                if let Some(name) = entry.file_name().to_str() {
                    keys.push(name.to_string());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}
