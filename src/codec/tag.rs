//! Type tag registry
//!
//! Maps every value kind to the 2-byte ASCII tag that opens its encoded form,
//! and every tag to the routine that decodes the bytes following it.

use std::fmt;

use super::decoder::{self, Decoder};
use super::Value;
use crate::error::Result;

/// Width of every tag on the wire
pub const TAG_SIZE: usize = 2;

/// Kind discriminant written at the start of every encoded value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Record,
    List,
    Dict,
    String,
    Integer,
    Float,
    Timestamp,
    Bytes,
}

/// Decodes the body of a value whose tag starts at the given position.
/// The decoder is positioned just past the tag.
pub type DecodeFn = fn(&mut Decoder<'_>, usize) -> Result<Value>;

impl Tag {
    pub const ALL: [Tag; 8] = [
        Tag::Record,
        Tag::List,
        Tag::Dict,
        Tag::String,
        Tag::Integer,
        Tag::Float,
        Tag::Timestamp,
        Tag::Bytes,
    ];

    /// The wire bytes for this tag
    pub const fn bytes(self) -> [u8; TAG_SIZE] {
        match self {
            Tag::Record => *b"mn",
            Tag::List => *b"li",
            Tag::Dict => *b"di",
            Tag::String => *b"st",
            Tag::Integer => *b"in",
            Tag::Float => *b"fl",
            Tag::Timestamp => *b"dt",
            Tag::Bytes => *b"by",
        }
    }

    /// Look up a tag by its wire bytes
    pub fn from_bytes(bytes: [u8; TAG_SIZE]) -> Option<Tag> {
        Tag::ALL.into_iter().find(|tag| tag.bytes() == bytes)
    }

    /// The tag a value is written under
    pub fn of(value: &Value) -> Tag {
        match value {
            Value::Integer(_) => Tag::Integer,
            Value::Float(_) => Tag::Float,
            Value::String(_) => Tag::String,
            Value::Bytes(_) => Tag::Bytes,
            Value::Timestamp(_) => Tag::Timestamp,
            Value::List(_) => Tag::List,
            Value::Dict(_) => Tag::Dict,
            Value::Record(_) => Tag::Record,
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.bytes();
        write!(f, "{}{}", bytes[0] as char, bytes[1] as char)
    }
}

/// Render a raw byte pair for error messages, escaping non-printables
pub(crate) fn describe_raw(bytes: [u8; TAG_SIZE]) -> String {
    bytes
        .iter()
        .flat_map(|b| std::ascii::escape_default(*b))
        .map(char::from)
        .collect()
}

/// Routine that decodes a value carrying `tag`
pub fn decoder_for(tag: Tag) -> DecodeFn {
    match tag {
        Tag::Record => decoder::reject_nested_record,
        Tag::List => decoder::decode_list,
        Tag::Dict => decoder::decode_dict,
        Tag::String => decoder::decode_string,
        Tag::Integer => decoder::decode_integer,
        Tag::Float => decoder::decode_float,
        Tag::Timestamp => decoder::decode_timestamp,
        Tag::Bytes => decoder::decode_bytes,
    }
}

/// Layout of the record's field list: field name and the tag it must carry
pub const RECORD_FIELDS: [(&str, Tag); 8] = [
    ("name", Tag::String),
    ("type", Tag::String),
    ("size", Tag::Integer),
    ("modified", Tag::Timestamp),
    ("description", Tag::String),
    ("notes", Tag::Dict),
    ("tags", Tag::List),
    ("data", Tag::Bytes),
];
