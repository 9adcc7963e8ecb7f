//! Value decoder
//!
//! Parses a buffer produced by the encoder back into a fresh value tree.
//! Nothing read from the buffer is trusted before it is checked: tags must be
//! registered (and match the expected kind where one is known), lengths must
//! fit in the remaining bytes, every list element must start exactly where the
//! list's offset index says it does, and the elements must fill exactly the
//! declared body length.

use bytes::Buf;
use tracing::debug;

use super::tag::{self, decoder_for, Tag, RECORD_FIELDS, TAG_SIZE};
use super::{Dict, Value, LEN_SIZE, MAX_DEPTH, RECORD_HEADER_SIZE};
use crate::error::{MomemError, Result};

/// Decode a complete buffer
///
/// A buffer starting with `mn` is decoded as a record, with its declared total
/// length checked against the buffer length first. Trailing bytes after the
/// root value are treated as corruption.
pub fn decode(buf: &[u8]) -> Result<Value> {
    let mut decoder = Decoder::new(buf);

    let value = if buf.starts_with(&Tag::Record.bytes()) {
        decoder.decode_record()?
    } else {
        decoder.decode_value()?
    };
    decoder.finish()?;

    debug!(kind = value.kind_name(), bytes = buf.len(), "decoded value");
    Ok(value)
}

/// Decode element `i` of a list straight from its offset index
///
/// Only the selected subtree is parsed; predecessors are never touched. The
/// subtree must end inside the list body as well as start there.
pub fn seek(buf: &[u8], index: &OffsetIndex, i: usize) -> Result<Value> {
    let offset = index.get(i).ok_or(MomemError::IndexOutOfBounds {
        index: i,
        len: index.len(),
    })?;

    let (body_start, body_end) = index.body_range();
    let position = usize::try_from(offset).unwrap_or(usize::MAX);
    if position < body_start || position >= body_end {
        return Err(MomemError::corrupt(
            format!(
                "offset {} of element {} lies outside its list body [{}, {})",
                offset, i, body_start, body_end
            ),
            index.list_position(),
        ));
    }

    let mut decoder = Decoder::at(buf, position);
    let value = decoder.decode_value()?;
    if decoder.position() > body_end {
        return Err(MomemError::corrupt(
            format!(
                "element {} ends at {}, past its list body end {}",
                i,
                decoder.position(),
                body_end
            ),
            position,
        ));
    }
    Ok(value)
}

// =============================================================================
// Offset Index
// =============================================================================

/// A list's table of absolute element positions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetIndex {
    /// Position of the list's `li` tag
    list_pos: usize,
    /// First byte after the index table
    body_start: usize,
    /// Declared length of the element bytes
    body_len: usize,
    offsets: Vec<u64>,
}

impl OffsetIndex {
    /// Read the index of the list whose tag sits at `list_pos`
    pub fn read(buf: &[u8], list_pos: usize) -> Result<Self> {
        let mut decoder = Decoder::at(buf, list_pos);
        decoder.expect_tag(Tag::List, "list")?;
        decoder.read_list_header(list_pos)
    }

    /// Check a record's header and read the index of its field list
    pub fn of_record(buf: &[u8]) -> Result<Self> {
        let mut decoder = Decoder::new(buf);
        decoder.read_record_header()?;
        Self::read(buf, RECORD_HEADER_SIZE)
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<u64> {
        self.offsets.get(i).copied()
    }

    pub fn offsets(&self) -> &[u64] {
        &self.offsets
    }

    pub fn list_position(&self) -> usize {
        self.list_pos
    }

    /// Half-open byte range covered by the list's elements
    pub fn body_range(&self) -> (usize, usize) {
        (self.body_start, self.body_start + self.body_len)
    }
}

// =============================================================================
// Decoder
// =============================================================================

/// Cursor over an encoded buffer
pub struct Decoder<'a> {
    buf: &'a [u8],
    pos: usize,
    /// Values currently being decoded above the cursor
    depth: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self::at(buf, 0)
    }

    /// Start decoding at an absolute position
    pub fn at(buf: &'a [u8], pos: usize) -> Self {
        Self { buf, pos, depth: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Decode whichever value starts at the cursor
    pub fn decode_value(&mut self) -> Result<Value> {
        let start = self.pos;
        if self.depth >= MAX_DEPTH {
            return Err(MomemError::corrupt(
                format!("nesting exceeds {} levels", MAX_DEPTH),
                start,
            ));
        }

        let tag = self.read_tag()?;
        self.depth += 1;
        let value = decoder_for(tag)(self, start);
        self.depth -= 1;
        value
    }

    /// Decode a record frame at the cursor
    pub fn decode_record(&mut self) -> Result<Value> {
        self.read_record_header()?;

        let list_pos = self.pos;
        self.expect_tag(Tag::List, "record field list")?;
        let header = self.read_list_header(list_pos)?;
        if header.len() != RECORD_FIELDS.len() {
            return Err(MomemError::corrupt(
                format!(
                    "record has {} fields, expected {}",
                    header.len(),
                    RECORD_FIELDS.len()
                ),
                list_pos,
            ));
        }

        let fields = self.decode_elements(&header, Some(&RECORD_FIELDS[..]))?;

        // The generic list decoder accepts any kind; record tags must be text
        if let Some(Value::List(tags)) = fields.get(6) {
            if let Some(bad) = tags.iter().find(|v| !matches!(v, Value::String(_))) {
                return Err(MomemError::corrupt(
                    format!("record tags must be strings, found {}", bad.kind_name()),
                    header.offsets[6] as usize,
                ));
            }
        }

        Ok(Value::Record(fields))
    }

    /// Fail unless every byte has been consumed
    pub fn finish(&self) -> Result<()> {
        if self.pos != self.buf.len() {
            return Err(MomemError::corrupt(
                format!("{} trailing bytes after value", self.buf.len() - self.pos),
                self.pos,
            ));
        }
        Ok(())
    }

    // =========================================================================
    // Headers
    // =========================================================================

    /// Consume `mn + totalLength`, checking the length against the buffer
    fn read_record_header(&mut self) -> Result<()> {
        self.expect_tag(Tag::Record, "record")?;
        let at = self.pos;
        let declared = self.read_u64()?;
        if declared != self.buf.len() as u64 {
            return Err(MomemError::corrupt(
                format!(
                    "record declares {} bytes but buffer holds {}",
                    declared,
                    self.buf.len()
                ),
                at,
            ));
        }
        Ok(())
    }

    /// Consume `bodyLength + count + offsets` (the tag is already consumed)
    fn read_list_header(&mut self, list_pos: usize) -> Result<OffsetIndex> {
        let body_len = self.read_len("list body")?;
        let count_at = self.pos;
        let count = self.read_u64()?;

        let table_len = usize::try_from(count)
            .ok()
            .and_then(|c| c.checked_mul(LEN_SIZE))
            .filter(|&len| len <= self.remaining())
            .ok_or_else(|| {
                MomemError::corrupt(
                    format!("list declares {} elements, buffer too short", count),
                    count_at,
                )
            })?;

        let mut table = self.take(table_len)?;
        let offsets = (0..count).map(|_| table.get_u64()).collect();

        let body_start = self.pos;
        if body_len > self.remaining() {
            return Err(MomemError::corrupt(
                format!(
                    "list body declares {} bytes, only {} remain",
                    body_len,
                    self.remaining()
                ),
                list_pos,
            ));
        }

        Ok(OffsetIndex {
            list_pos,
            body_start,
            body_len,
            offsets,
        })
    }

    /// Decode a list's elements sequentially, checking each against the index
    fn decode_elements(
        &mut self,
        header: &OffsetIndex,
        expected: Option<&[(&str, Tag)]>,
    ) -> Result<Vec<Value>> {
        let mut items = Vec::with_capacity(header.len());

        for (i, &offset) in header.offsets.iter().enumerate() {
            if self.pos as u64 != offset {
                return Err(MomemError::corrupt(
                    format!(
                        "element {} starts at {} but the offset index says {}",
                        i, self.pos, offset
                    ),
                    self.pos,
                ));
            }

            if let Some(&(name, tag)) = expected.and_then(|fields| fields.get(i)) {
                self.peek_expect(tag, name)?;
            }
            items.push(self.decode_value()?);
        }

        let (body_start, body_end) = header.body_range();
        if self.pos != body_end {
            return Err(MomemError::corrupt(
                format!(
                    "list body declares {} bytes but elements occupy {}",
                    header.body_len,
                    self.pos - body_start
                ),
                header.list_pos,
            ));
        }
        Ok(items)
    }

    // =========================================================================
    // Primitive Reads
    // =========================================================================

    fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(MomemError::corrupt(
                format!("truncated: needed {} bytes, {} remain", n, self.remaining()),
                self.pos,
            ));
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_u64(&mut self) -> Result<u64> {
        Ok(self.take(LEN_SIZE)?.get_u64())
    }

    /// Read a length field and make sure that many bytes could follow
    fn read_len(&mut self, what: &str) -> Result<usize> {
        let at = self.pos;
        let len = self.read_u64()?;
        usize::try_from(len)
            .ok()
            .filter(|&len| len <= self.remaining())
            .ok_or_else(|| {
                MomemError::corrupt(
                    format!(
                        "{} length {} exceeds the {} remaining bytes",
                        what,
                        len,
                        self.remaining()
                    ),
                    at,
                )
            })
    }

    fn read_raw_tag(&mut self) -> Result<[u8; TAG_SIZE]> {
        let bytes = self.take(TAG_SIZE)?;
        Ok([bytes[0], bytes[1]])
    }

    fn read_tag(&mut self) -> Result<Tag> {
        let at = self.pos;
        let raw = self.read_raw_tag()?;
        Tag::from_bytes(raw).ok_or_else(|| {
            MomemError::corrupt(format!("unknown tag `{}`", tag::describe_raw(raw)), at)
        })
    }

    fn expect_tag(&mut self, expected: Tag, what: &str) -> Result<()> {
        self.peek_expect(expected, what)?;
        self.pos += TAG_SIZE;
        Ok(())
    }

    /// Check the tag at the cursor without consuming it
    fn peek_expect(&mut self, expected: Tag, what: &str) -> Result<()> {
        let at = self.pos;
        let raw = self.read_raw_tag()?;
        self.pos = at;
        if raw != expected.bytes() {
            return Err(MomemError::corrupt(
                format!(
                    "expected `{}` for {}, found `{}`",
                    expected,
                    what,
                    tag::describe_raw(raw)
                ),
                at,
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Per-Tag Decode Routines (registered in `tag::decoder_for`)
// =============================================================================

pub(crate) fn decode_integer(dec: &mut Decoder<'_>, _start: usize) -> Result<Value> {
    Ok(Value::Integer(dec.read_u64()?))
}

pub(crate) fn decode_float(dec: &mut Decoder<'_>, _start: usize) -> Result<Value> {
    let f = dec.take(4)?.get_f32();
    Ok(Value::Float(f64::from(f)))
}

pub(crate) fn decode_timestamp(dec: &mut Decoder<'_>, _start: usize) -> Result<Value> {
    Ok(Value::Timestamp(dec.take(8)?.get_f64()))
}

pub(crate) fn decode_string(dec: &mut Decoder<'_>, start: usize) -> Result<Value> {
    let len = dec.read_len("string")?;
    let body = dec.take(len)?;
    let s = std::str::from_utf8(body).map_err(|e| {
        MomemError::corrupt(format!("string is not valid UTF-8: {}", e), start)
    })?;
    Ok(Value::String(s.to_string()))
}

pub(crate) fn decode_bytes(dec: &mut Decoder<'_>, _start: usize) -> Result<Value> {
    let len = dec.read_len("bytes")?;
    Ok(Value::Bytes(dec.take(len)?.to_vec()))
}

pub(crate) fn decode_list(dec: &mut Decoder<'_>, start: usize) -> Result<Value> {
    let header = dec.read_list_header(start)?;
    Ok(Value::List(dec.decode_elements(&header, None)?))
}

pub(crate) fn decode_dict(dec: &mut Decoder<'_>, start: usize) -> Result<Value> {
    let list_pos = dec.pos;
    dec.expect_tag(Tag::List, "flattened dict")?;
    let header = dec.read_list_header(list_pos)?;
    if header.len() % 2 != 0 {
        return Err(MomemError::corrupt(
            format!("flattened dict has odd length {}", header.len()),
            start,
        ));
    }

    let items = dec.decode_elements(&header, None)?;
    Dict::from_flat(items)
        .map(Value::Dict)
        .ok_or_else(|| MomemError::corrupt("flattened dict has odd length", start))
}

pub(crate) fn reject_nested_record(_dec: &mut Decoder<'_>, start: usize) -> Result<Value> {
    Err(MomemError::corrupt(
        "record tag found below the root of the buffer",
        start,
    ))
}
