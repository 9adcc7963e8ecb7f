//! # MoMem
//!
//! A flat-file record store built on a self-describing binary codec:
//! - Tagged, length-prefixed encoding of a small closed set of value kinds
//! - Absolute offset index per list for direct-seek decoding
//! - Corruption detection on every tag, length and offset
//! - Fixed 8-field records persisted one file per record
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Record Store                          │
//! │              (ids, retries, save / load / list)              │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                      Record Adapter                          │
//! │            (Record <-> Value, field width checks)            │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │   Encoder   │          │   Decoder   │
//!   │ (+ offsets) │          │  (+ seek)   │
//!   └──────┬──────┘          └──────▲──────┘
//!          │      Type Tag Registry │
//!          ▼                        │
//!   ┌───────────────────────────────┴─────┐
//!   │               Storage               │
//!   │   (MemoryStore / FileStore, keyed)  │
//!   └─────────────────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod codec;
pub mod record;
pub mod file_type;
pub mod storage;
pub mod catalog;
pub mod record_store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{MomemError, Result};
pub use config::Config;
pub use codec::{decode, encode, seek, Dict, OffsetIndex, Value};
pub use record::{from_record, to_record, Record};
pub use record_store::{IdGenerator, RandomIds, RecordStore};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of MoMem
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
