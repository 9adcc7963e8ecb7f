//! Record Store
//!
//! Saves and loads records by identifier over any [`Storage`].
//!
//! ## Responsibilities
//! - Encode records fully in memory before any I/O
//! - Pick fresh identifiers, retrying on collisions
//! - Decode and adapt stored buffers back into records

use bytes::Bytes;
use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::codec;
use crate::config::Config;
use crate::error::{MomemError, Result};
use crate::record::{self, Record};
use crate::storage::Storage;

// =============================================================================
// Identifier Generation
// =============================================================================

/// Source of candidate record identifiers
///
/// Owned by whoever saves records; there is no process-wide generator.
pub trait IdGenerator {
    fn next_id(&mut self) -> String;
}

/// Random alphanumeric identifiers with a fixed suffix
pub struct RandomIds<R = StdRng> {
    rng: R,
    length: usize,
    extension: String,
}

impl RandomIds<StdRng> {
    /// Entropy-seeded generator using the configured length and extension
    pub fn from_config(config: &Config) -> Self {
        Self::with_rng(
            StdRng::from_entropy(),
            config.id_length,
            config.id_extension.clone(),
        )
    }
}

impl<R: Rng> RandomIds<R> {
    pub fn with_rng(rng: R, length: usize, extension: impl Into<String>) -> Self {
        Self {
            rng,
            length,
            extension: extension.into(),
        }
    }
}

impl<R: Rng> IdGenerator for RandomIds<R> {
    fn next_id(&mut self) -> String {
        let mut id: String = (&mut self.rng)
            .sample_iter(&Alphanumeric)
            .take(self.length)
            .map(char::from)
            .collect();
        id.push_str(&self.extension);
        id
    }
}

// =============================================================================
// Record Store
// =============================================================================

/// Record persistence over a byte store
pub struct RecordStore<S, G> {
    storage: S,
    ids: G,
    max_id_attempts: usize,
}

impl<S: Storage, G: IdGenerator> RecordStore<S, G> {
    pub fn new(storage: S, ids: G, max_id_attempts: usize) -> Self {
        Self {
            storage,
            ids,
            max_id_attempts,
        }
    }

    /// Save under a freshly generated identifier and return it
    ///
    /// Collisions are retried with a new identifier up to `max_id_attempts`
    /// times; any other storage error is returned as-is.
    pub fn save(&mut self, record: &Record) -> Result<String> {
        let encoded = encode_record(record)?;

        for attempt in 1..=self.max_id_attempts {
            let id = self.ids.next_id();
            match self.storage.put(&id, &encoded, false) {
                Ok(()) => {
                    debug!(id = %id, bytes = encoded.len(), "saved record");
                    return Ok(id);
                }
                Err(MomemError::AlreadyExists(_)) => {
                    warn!(id = %id, attempt, "record id collision, retrying");
                }
                Err(e) => return Err(e),
            }
        }

        Err(MomemError::IdExhausted {
            attempts: self.max_id_attempts,
        })
    }

    /// Save under a caller-chosen identifier
    pub fn save_as(&self, id: &str, record: &Record, overwrite: bool) -> Result<()> {
        let encoded = encode_record(record)?;
        self.storage.put(id, &encoded, overwrite)
    }

    pub fn load(&self, id: &str) -> Result<Record> {
        let buf = self.storage.get(id)?;
        record::to_record(codec::decode(&buf)?)
    }

    /// Raw encoded bytes of a stored record
    pub fn load_raw(&self, id: &str) -> Result<Bytes> {
        self.storage.get(id)
    }

    pub fn remove(&self, id: &str) -> Result<()> {
        self.storage.delete(id)
    }

    pub fn ids(&self) -> Result<Vec<String>> {
        self.storage.list_keys()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}

fn encode_record(record: &Record) -> Result<Bytes> {
    let value = record::from_record(record.clone())?;
    codec::encode(&value)
}
