//! Record Adapter
//!
//! The fixed 8-field record and its mapping to and from the generic
//! `Value::Record` representation.
//!
//! ## Field Layout
//! ```text
//! ┌──────┬──────┬──────┬──────────┬─────────────┬───────┬──────┬──────┐
//! │ name │ type │ size │ modified │ description │ notes │ tags │ data │
//! │  st  │  st  │  in  │    dt    │     st      │  di   │  li  │  by  │
//! └──────┴──────┴──────┴──────────┴─────────────┴───────┴──────┴──────┘
//! ```

use chrono::{DateTime, Utc};

use crate::codec::{Dict, Tag, Value, RECORD_FIELDS};
use crate::error::{MomemError, Result};
use crate::file_type;

/// Maximum characters in `name` and `type`
pub const MAX_LABEL_LEN: usize = 40;

/// Maximum characters in the decimal representation of `size`
pub const MAX_SIZE_DIGITS: usize = 10;

/// A stored item and its metadata
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// File name, extension included
    pub name: String,

    /// Type label (`image`, `text`, ...)
    pub file_type: String,

    /// Payload size in bytes
    pub size: u64,

    /// Creation or last modification time
    pub modified: DateTime<Utc>,

    pub description: String,

    /// Free-form details
    pub notes: Dict,

    pub tags: Vec<String>,

    pub data: Vec<u8>,
}

impl Record {
    /// Create a record with empty description, notes and tags
    ///
    /// `size` is taken from the payload and `modified` is set to now.
    pub fn new(name: impl Into<String>, file_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            file_type: file_type.into(),
            size: data.len() as u64,
            modified: Utc::now(),
            description: String::new(),
            notes: Dict::new(),
            tags: Vec::new(),
            data,
        }
    }

    /// Create a record for a file, deriving the type label from its extension
    pub fn from_file(name: impl Into<String>, data: Vec<u8>) -> Self {
        let name = name.into();
        let file_type = file_type::label_for(&name);
        Self::new(name, file_type, data)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_note(mut self, key: impl Into<Value>, value: impl Into<Value>) -> Self {
        self.notes.insert(key, value);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_modified(mut self, modified: DateTime<Utc>) -> Self {
        self.modified = modified;
        self
    }

    /// Override the size derived from the payload
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    /// Check the fixed field widths
    pub fn validate(&self) -> Result<()> {
        check_widths(&self.name, &self.file_type, self.size)
    }
}

// =============================================================================
// Adapter
// =============================================================================

/// Convert a record into its generic value form
///
/// Fails fast with `Validation` if a field exceeds its width.
pub fn from_record(record: Record) -> Result<Value> {
    record.validate()?;

    Ok(Value::Record(vec![
        Value::String(record.name),
        Value::String(record.file_type),
        Value::Integer(record.size),
        Value::Timestamp(timestamp_from_datetime(&record.modified)),
        Value::String(record.description),
        Value::Dict(record.notes),
        Value::List(record.tags.into_iter().map(Value::String).collect()),
        Value::Bytes(record.data),
    ]))
}

/// Recover a record from its generic value form
pub fn to_record(value: Value) -> Result<Record> {
    let fields = match value {
        Value::Record(fields) => fields,
        other => {
            return Err(MomemError::UnsupportedType(format!(
                "expected a record, found {}",
                other.kind_name()
            )))
        }
    };
    check_layout(&fields)?;

    let mut fields = fields.into_iter();
    let mut next = || fields.next().ok_or_else(|| layout_error(RECORD_FIELDS.len()));

    let name = expect_string(next()?, "name")?;
    let file_type = expect_string(next()?, "type")?;
    let size = match next()? {
        Value::Integer(i) => i,
        other => return Err(field_kind_error("size", Tag::Integer, &other)),
    };
    let modified = match next()? {
        Value::Timestamp(t) => {
            datetime_from_timestamp(t).ok_or(MomemError::InvalidTimestamp(t))?
        }
        other => return Err(field_kind_error("modified", Tag::Timestamp, &other)),
    };
    let description = expect_string(next()?, "description")?;
    let notes = match next()? {
        Value::Dict(d) => d,
        other => return Err(field_kind_error("notes", Tag::Dict, &other)),
    };
    let tags = match next()? {
        Value::List(items) => items
            .into_iter()
            .map(|v| expect_string(v, "tags"))
            .collect::<Result<Vec<_>>>()?,
        other => return Err(field_kind_error("tags", Tag::List, &other)),
    };
    let data = match next()? {
        Value::Bytes(b) => b,
        other => return Err(field_kind_error("data", Tag::Bytes, &other)),
    };

    Ok(Record {
        name,
        file_type,
        size,
        modified,
        description,
        notes,
        tags,
        data,
    })
}

/// Check a generic field list before it is encoded as a record
pub(crate) fn validate_fields(fields: &[Value]) -> Result<()> {
    check_layout(fields)?;

    let name = fields[0].as_str().unwrap_or_default();
    let file_type = fields[1].as_str().unwrap_or_default();
    let size = fields[2].as_u64().unwrap_or_default();
    check_widths(name, file_type, size)
}

// =============================================================================
// Timestamps
// =============================================================================

/// POSIX seconds at double precision
pub fn timestamp_from_datetime(dt: &DateTime<Utc>) -> f64 {
    dt.timestamp() as f64 + f64::from(dt.timestamp_subsec_nanos()) / 1e9
}

/// Inverse of [`timestamp_from_datetime`], rounded to the nearest nanosecond
pub fn datetime_from_timestamp(t: f64) -> Option<DateTime<Utc>> {
    if !t.is_finite() {
        return None;
    }
    let mut secs = t.floor();
    let mut nanos = ((t - secs) * 1e9).round();
    if nanos >= 1e9 {
        secs += 1.0;
        nanos = 0.0;
    }
    DateTime::from_timestamp(secs as i64, nanos as u32)
}

// =============================================================================
// Private Helpers
// =============================================================================

fn check_widths(name: &str, file_type: &str, size: u64) -> Result<()> {
    let name_len = name.chars().count();
    if name_len > MAX_LABEL_LEN {
        return Err(MomemError::Validation {
            field: "name",
            limit: MAX_LABEL_LEN,
            actual: name_len,
        });
    }

    let type_len = file_type.chars().count();
    if type_len > MAX_LABEL_LEN {
        return Err(MomemError::Validation {
            field: "type",
            limit: MAX_LABEL_LEN,
            actual: type_len,
        });
    }

    let size_digits = size.to_string().len();
    if size_digits > MAX_SIZE_DIGITS {
        return Err(MomemError::Validation {
            field: "size",
            limit: MAX_SIZE_DIGITS,
            actual: size_digits,
        });
    }

    Ok(())
}

/// Field count, per-field kinds, and string-only tags
fn check_layout(fields: &[Value]) -> Result<()> {
    if fields.len() != RECORD_FIELDS.len() {
        return Err(layout_error(fields.len()));
    }

    for (field, &(name, tag)) in fields.iter().zip(RECORD_FIELDS.iter()) {
        if Tag::of(field) != tag {
            return Err(field_kind_error(name, tag, field));
        }
    }

    if let Value::List(tags) = &fields[6] {
        if let Some(bad) = tags.iter().find(|v| !matches!(v, Value::String(_))) {
            return Err(field_kind_error("tags", Tag::String, bad));
        }
    }
    Ok(())
}

fn layout_error(found: usize) -> MomemError {
    MomemError::UnsupportedType(format!(
        "record needs exactly {} fields, found {}",
        RECORD_FIELDS.len(),
        found
    ))
}

fn field_kind_error(field: &str, expected: Tag, found: &Value) -> MomemError {
    MomemError::UnsupportedType(format!(
        "record field `{}` must be `{}`, found {}",
        field,
        expected,
        found.kind_name()
    ))
}

fn expect_string(value: Value, field: &str) -> Result<String> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(field_kind_error(field, Tag::String, &other)),
    }
}
