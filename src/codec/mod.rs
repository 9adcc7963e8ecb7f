//! Codec Module
//!
//! Tagged, length-prefixed binary format for value trees.
//!
//! ## Wire Format
//!
//! Every value starts with a 2-byte ASCII tag. Lengths, counts and offsets
//! are 8-byte big-endian unsigned integers.
//!
//! ```text
//! Integer    ┌─────────┬──────────────┐
//!            │ "in"(2) │ magnitude(8) │
//!            └─────────┴──────────────┘
//! Float      ┌─────────┬──────────────┐
//!            │ "fl"(2) │ f32 BE (4)   │
//!            └─────────┴──────────────┘
//! Timestamp  ┌─────────┬──────────────┐
//!            │ "dt"(2) │ f64 BE (8)   │   POSIX seconds
//!            └─────────┴──────────────┘
//! String     ┌─────────┬────────┬───────┐
//! Bytes      │"st"/"by"│ Len(8) │ body  │
//!            └─────────┴────────┴───────┘
//! List       ┌─────────┬────────────┬──────────┬───────────────┬──────────┐
//!            │ "li"(2) │ BodyLen(8) │ Count(8) │ Count×Offset  │ elements │
//!            └─────────┴────────────┴──────────┴───────────────┴──────────┘
//! Dict       ┌─────────┬─────────────────────────────────────┐
//!            │ "di"(2) │ List [k0, v0, k1, v1, ...]          │
//!            └─────────┴─────────────────────────────────────┘
//! Record     ┌─────────┬─────────────┬────────────────────────────────────┐
//! (root)     │ "mn"(2) │ TotalLen(8) │ List [name, type, size, modified,  │
//!            │         │             │       description, notes, tags,    │
//!            │         │             │       data]                        │
//!            └─────────┴─────────────┴────────────────────────────────────┘
//! ```
//!
//! - `BodyLen` counts only the concatenated elements.
//! - `Offset[i]` is the absolute position of element `i`'s tag within the
//!   whole buffer, so any element can be decoded with [`seek`] alone.
//! - `TotalLen` is the length of the entire buffer, checked before any offset
//!   is trusted.

mod decoder;
mod encoder;
mod tag;
mod value;

pub use decoder::{decode, seek, Decoder, OffsetIndex};
pub use encoder::{encode, encoded_len, Encoder};
pub use tag::{decoder_for, DecodeFn, Tag, RECORD_FIELDS, TAG_SIZE};
pub use value::{Dict, Value};

/// Width of every length, count and offset field
pub const LEN_SIZE: usize = 8;

/// `li` + body length + element count
pub const LIST_HEADER_SIZE: usize = TAG_SIZE + 2 * LEN_SIZE;

/// `mn` + total length
pub const RECORD_HEADER_SIZE: usize = TAG_SIZE + LEN_SIZE;

/// Most containers a value may sit inside (record frame not counted)
///
/// Enforced on encode, size estimation and decode, so recursion depth stays
/// bounded for any buffer.
pub const MAX_DEPTH: usize = 64;
