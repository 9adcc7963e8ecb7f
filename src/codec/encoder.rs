//! Value encoder
//!
//! Serializes a value tree into one contiguous buffer. The buffer's length is
//! the running cursor: every offset written into a list's index is the
//! absolute position of an element's tag within the final output.
//!
//! Containers reserve their length and offset slots up front and patch them
//! once their elements have been written.

use bytes::{BufMut, Bytes, BytesMut};
use tracing::debug;

use super::tag::{Tag, TAG_SIZE};
use super::{Value, LEN_SIZE, LIST_HEADER_SIZE, MAX_DEPTH, RECORD_HEADER_SIZE};
use crate::error::{MomemError, Result};
use crate::record;

/// Encode a value tree into a fresh buffer
///
/// A `Value::Record` root is framed with `mn` and the total buffer length;
/// any other root is written bare, with offsets counted from 0.
pub fn encode(value: &Value) -> Result<Bytes> {
    let mut encoder = Encoder::with_capacity(encoded_len(value)?);

    match value {
        Value::Record(fields) => encoder.encode_record(fields)?,
        other => encoder.encode_value(other)?,
    }

    let out = encoder.finish();
    debug!(kind = value.kind_name(), bytes = out.len(), "encoded value");
    Ok(out)
}

/// Incremental writer over a single output buffer
pub struct Encoder {
    buf: BytesMut,
    /// Values currently being written above the cursor
    depth: usize,
}

impl Encoder {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
            depth: 0,
        }
    }

    /// Absolute position the next byte will be written at
    pub fn cursor(&self) -> u64 {
        self.buf.len() as u64
    }

    pub fn finish(self) -> Bytes {
        self.buf.freeze()
    }

    /// Write the record frame: `mn + totalLength + list(fields)`
    pub fn encode_record(&mut self, fields: &[Value]) -> Result<()> {
        if !self.buf.is_empty() {
            return Err(MomemError::UnsupportedType(
                "record values may only appear at the root of a buffer".to_string(),
            ));
        }
        record::validate_fields(fields)?;

        self.put_tag(Tag::Record);
        let total_slot = self.reserve_u64();
        self.encode_list(fields.len(), fields.iter())?;

        let total = self.cursor();
        self.patch_u64(total_slot, total);
        Ok(())
    }

    /// Write any non-record value at the cursor
    pub fn encode_value(&mut self, value: &Value) -> Result<()> {
        if self.depth >= MAX_DEPTH {
            return Err(too_deep());
        }
        self.depth += 1;
        let result = self.write_value(value);
        self.depth -= 1;
        result
    }

    fn write_value(&mut self, value: &Value) -> Result<()> {
        match value {
            Value::Integer(i) => {
                self.put_tag(Tag::Integer);
                self.buf.put_u64(*i);
            }
            Value::Float(f) => {
                self.put_tag(Tag::Float);
                // Narrowing to single precision is part of the format
                self.buf.put_f32(*f as f32);
            }
            Value::Timestamp(t) => {
                self.put_tag(Tag::Timestamp);
                self.buf.put_f64(*t);
            }
            Value::String(s) => self.put_blob(Tag::String, s.as_bytes()),
            Value::Bytes(b) => self.put_blob(Tag::Bytes, b),
            Value::List(items) => self.encode_list(items.len(), items.iter())?,
            Value::Dict(dict) => {
                self.put_tag(Tag::Dict);
                self.encode_list(dict.len() * 2, dict.flat_iter())?;
            }
            Value::Record(_) => {
                return Err(MomemError::UnsupportedType(
                    "record values may only appear at the root of a buffer".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Write `li + bodyLength + count + offsets + elements`
    fn encode_list<'v>(
        &mut self,
        count: usize,
        items: impl Iterator<Item = &'v Value>,
    ) -> Result<()> {
        self.put_tag(Tag::List);
        let body_len_slot = self.reserve_u64();
        self.buf.put_u64(count as u64);
        let index_slot = self.buf.len();
        self.buf.put_bytes(0, count * LEN_SIZE);

        let body_start = self.buf.len();
        for (i, item) in items.enumerate() {
            let offset = self.cursor();
            self.patch_u64(index_slot + i * LEN_SIZE, offset);
            self.encode_value(item)?;
        }

        let body_len = (self.buf.len() - body_start) as u64;
        self.patch_u64(body_len_slot, body_len);
        Ok(())
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn put_tag(&mut self, tag: Tag) {
        self.buf.put_slice(&tag.bytes());
    }

    fn put_blob(&mut self, tag: Tag, body: &[u8]) {
        self.put_tag(tag);
        self.buf.put_u64(body.len() as u64);
        self.buf.put_slice(body);
    }

    /// Write a zeroed u64 placeholder, returning its position
    fn reserve_u64(&mut self) -> usize {
        let at = self.buf.len();
        self.buf.put_u64(0);
        at
    }

    fn patch_u64(&mut self, at: usize, value: u64) {
        self.buf[at..at + LEN_SIZE].copy_from_slice(&value.to_be_bytes());
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Exact encoded size of a value, used to size the output buffer once
///
/// Fails with `UnsupportedType` if the tree nests deeper than [`MAX_DEPTH`].
pub fn encoded_len(value: &Value) -> Result<usize> {
    match value {
        Value::Record(fields) => {
            Ok(RECORD_HEADER_SIZE + list_len(fields.len(), fields.iter(), 0)?)
        }
        other => value_len(other, 0),
    }
}

/// `parents` counts the containers enclosing `value`
fn value_len(value: &Value, parents: usize) -> Result<usize> {
    if parents >= MAX_DEPTH {
        return Err(too_deep());
    }

    let len = match value {
        Value::Integer(_) | Value::Timestamp(_) => TAG_SIZE + 8,
        Value::Float(_) => TAG_SIZE + 4,
        Value::String(s) => TAG_SIZE + LEN_SIZE + s.len(),
        Value::Bytes(b) => TAG_SIZE + LEN_SIZE + b.len(),
        Value::List(items) => list_len(items.len(), items.iter(), parents + 1)?,
        Value::Dict(dict) => TAG_SIZE + list_len(dict.len() * 2, dict.flat_iter(), parents + 1)?,
        Value::Record(fields) => {
            RECORD_HEADER_SIZE + list_len(fields.len(), fields.iter(), parents + 1)?
        }
    };
    Ok(len)
}

fn list_len<'v>(
    count: usize,
    items: impl Iterator<Item = &'v Value>,
    parents: usize,
) -> Result<usize> {
    let mut len = LIST_HEADER_SIZE + count * LEN_SIZE;
    for item in items {
        len += value_len(item, parents)?;
    }
    Ok(len)
}

fn too_deep() -> MomemError {
    MomemError::UnsupportedType(format!("value nesting exceeds {} levels", MAX_DEPTH))
}
