//! Configuration for MoMem
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{MomemError, Result};

/// Main configuration for a MoMem instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory holding every database
    /// Internal structure:
    ///   {root_dir}/
    ///     └── {database}/
    ///           └── {collection}/
    ///                 └── data/      (one file per record)
    pub root_dir: PathBuf,

    // -------------------------------------------------------------------------
    // Identifier Configuration
    // -------------------------------------------------------------------------
    /// Number of random alphanumeric characters in a record id
    pub id_length: usize,

    /// Suffix appended to every generated record id
    pub id_extension: String,

    /// How many fresh ids to try before giving up on a save
    pub max_id_attempts: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("./momem_data"),
            id_length: 15,
            id_extension: ".mn".to_string(),
            max_id_attempts: 10,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject settings that would make id generation impossible
    pub fn validate(&self) -> Result<()> {
        if self.id_length == 0 {
            return Err(MomemError::Config("id_length must be at least 1".to_string()));
        }
        if self.max_id_attempts == 0 {
            return Err(MomemError::Config(
                "max_id_attempts must be at least 1".to_string(),
            ));
        }
        if self.id_extension.contains(|c| c == '/' || c == '\\') {
            return Err(MomemError::Config(format!(
                "id_extension {:?} contains a path separator",
                self.id_extension
            )));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the root directory (holds every database)
    pub fn root_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.root_dir = path.into();
        self
    }

    /// Set the number of random characters in a record id
    pub fn id_length(mut self, len: usize) -> Self {
        self.config.id_length = len;
        self
    }

    /// Set the suffix appended to generated ids
    pub fn id_extension(mut self, ext: impl Into<String>) -> Self {
        self.config.id_extension = ext.into();
        self
    }

    /// Set the number of id attempts per save
    pub fn max_id_attempts(mut self, attempts: usize) -> Self {
        self.config.max_id_attempts = attempts;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
