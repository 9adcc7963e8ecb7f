//! Catalog Module
//!
//! Databases and collections laid out as directories.
//!
//! ## Layout
//! ```text
//! {root_dir}/
//!   └── {database}/
//!         └── {collection}/
//!               └── data/
//!                     ├── {record id}
//!                     └── ...
//! ```
//!
//! A collection's `data/` directory is a [`FileStore`]; everything above it is
//! plain directory bookkeeping.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::Config;
use crate::error::{MomemError, Result};
use crate::storage::{validate_key, FileStore};

/// Root of all databases
pub struct Catalog {
    root: PathBuf,
}

impl Catalog {
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    const DATA_DIR: &'static str = "data";

    /// Open the catalog rooted at `config.root_dir`, creating it if needed
    pub fn open(config: &Config) -> Result<Self> {
        config.validate()?;
        Self::open_path(&config.root_dir)
    }

    /// Open with a path (convenience method)
    pub fn open_path(root: &Path) -> Result<Self> {
        fs::create_dir_all(root)?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create a new, empty database
    pub fn create_database(&self, name: &str) -> Result<Database> {
        let path = child_path(&self.root, name)?;
        create_dir_new(&path, name)?;
        info!(database = name, "created database");
        Ok(Database {
            name: name.to_string(),
            path,
        })
    }

    /// Look up an existing database
    pub fn database(&self, name: &str) -> Result<Database> {
        let path = child_path(&self.root, name)?;
        if !path.is_dir() {
            return Err(MomemError::NotFound(format!("database {}", name)));
        }
        Ok(Database {
            name: name.to_string(),
            path,
        })
    }

    pub fn list_databases(&self) -> Result<Vec<String>> {
        list_subdirs(&self.root)
    }

    /// Delete a database; it must hold no collections
    pub fn delete_database(&self, name: &str) -> Result<()> {
        let db = self.database(name)?;
        if !db.list_collections()?.is_empty() {
            return Err(MomemError::NotEmpty(format!("database {}", name)));
        }
        fs::remove_dir(&db.path)?;
        info!(database = name, "deleted database");
        Ok(())
    }
}

/// A directory of collections
#[derive(Debug, Clone)]
pub struct Database {
    name: String,
    path: PathBuf,
}

impl Database {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create a new collection along with its data directory
    pub fn create_collection(&self, name: &str) -> Result<Collection> {
        let path = child_path(&self.path, name)?;
        create_dir_new(&path, name)?;
        fs::create_dir(path.join(Catalog::DATA_DIR))?;
        info!(database = %self.name, collection = name, "created collection");
        Ok(Collection {
            name: name.to_string(),
            database: self.name.clone(),
            path,
        })
    }

    /// Look up an existing collection
    pub fn collection(&self, name: &str) -> Result<Collection> {
        let path = child_path(&self.path, name)?;
        if !path.is_dir() {
            return Err(MomemError::NotFound(format!(
                "collection {}/{}",
                self.name, name
            )));
        }
        Ok(Collection {
            name: name.to_string(),
            database: self.name.clone(),
            path,
        })
    }

    pub fn list_collections(&self) -> Result<Vec<String>> {
        list_subdirs(&self.path)
    }
}

/// A directory of stored records
#[derive(Debug, Clone)]
pub struct Collection {
    name: String,
    database: String,
    path: PathBuf,
}

impl Collection {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn data_dir(&self) -> PathBuf {
        self.path.join(Catalog::DATA_DIR)
    }

    /// Byte store over this collection's data directory
    pub fn store(&self) -> Result<FileStore> {
        FileStore::open(&self.data_dir())
    }

    /// Delete the collection; it must hold no records
    pub fn delete(self) -> Result<()> {
        let data_dir = self.data_dir();
        if data_dir.is_dir() && fs::read_dir(&data_dir)?.next().is_some() {
            return Err(MomemError::NotEmpty(format!(
                "collection {}/{}",
                self.database, self.name
            )));
        }
        fs::remove_dir_all(&self.path)?;
        info!(database = %self.database, collection = %self.name, "deleted collection");
        Ok(())
    }
}

// =============================================================================
// Private Helpers
// =============================================================================

/// Names follow the same rules as storage keys: one path component
fn child_path(parent: &Path, name: &str) -> Result<PathBuf> {
    validate_key(name)?;
    Ok(parent.join(name))
}

fn create_dir_new(path: &Path, name: &str) -> Result<()> {
    fs::create_dir(path).map_err(|e| match e.kind() {
        ErrorKind::AlreadyExists => MomemError::AlreadyExists(name.to_string()),
        _ => MomemError::Io(e),
    })
}

fn list_subdirs(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}
