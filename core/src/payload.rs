//! Request payloads and the chunking of record sequences.
//!
//! # Design
//! `Payload` makes the shape of the data explicit at the boundary of
//! `Client::post`: only sequences (concrete or lazy) can be split into
//! chunks. A lazy sequence is pulled one chunk at a time, so a chunked post
//! never holds more than `chunk_size` records in memory, and it is collected
//! into a concrete array before encoding when it is posted whole.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::encode::encode_json;
use crate::error::{ClientError, Result};

/// Data sent as a request body.
pub enum Payload<'a> {
    /// A concrete ordered sequence of records.
    Sequence(Vec<Value>),
    /// A single-pass sequence of records.
    Lazy(Box<dyn Iterator<Item = Value> + 'a>),
    /// A mapping or scalar, sent as one JSON value.
    Single(Value),
    /// Pre-encoded text, sent verbatim.
    Raw(String),
}

impl<'a> Payload<'a> {
    /// Wraps a single-pass iterator of records.
    pub fn lazy<I>(records: I) -> Self
    where
        I: IntoIterator<Item = Value>,
        I::IntoIter: 'a,
    {
        Payload::Lazy(Box::new(records.into_iter()))
    }

    /// Converts any serializable value, turning JSON arrays into sequences.
    ///
    /// Datetime fields must go through [`Timestamp`](crate::encode::Timestamp)
    /// or `#[serde(serialize_with = "pp_client::encode::iso8601::serialize")]`
    /// so they carry an explicit UTC offset.
    pub fn from_serialize<T: Serialize + ?Sized>(data: &T) -> Result<Self> {
        serde_json::to_value(data)
            .map(Payload::from)
            .map_err(ClientError::Serialization)
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self, Payload::Sequence(_) | Payload::Lazy(_))
    }

    /// Encodes the whole payload into one request body.
    pub fn into_body(self) -> Result<String> {
        match self {
            Payload::Raw(text) => Ok(text),
            Payload::Sequence(records) => encode_json(&records),
            Payload::Lazy(records) => encode_json(&records.collect::<Vec<_>>()),
            Payload::Single(value) => encode_json(&value),
        }
    }

    /// Splits a sequence into consecutive chunks of at most `size` records.
    pub fn into_chunks(self, size: usize) -> Result<Chunks<'a>> {
        if size == 0 {
            return Err(ClientError::Chunking("chunk size must be positive".to_string()));
        }
        let source: Box<dyn Iterator<Item = Value> + 'a> = match self {
            Payload::Sequence(records) => Box::new(records.into_iter()),
            Payload::Lazy(records) => records,
            Payload::Single(_) | Payload::Raw(_) => {
                return Err(ClientError::Chunking("can only chunk sequences".to_string()))
            }
        };
        Ok(Chunks { source, size })
    }
}

impl fmt::Debug for Payload<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Sequence(records) => f.debug_tuple("Sequence").field(records).finish(),
            Payload::Lazy(_) => f.write_str("Lazy(..)"),
            Payload::Single(value) => f.debug_tuple("Single").field(value).finish(),
            Payload::Raw(text) => f.debug_tuple("Raw").field(text).finish(),
        }
    }
}

impl From<Value> for Payload<'_> {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(records) => Payload::Sequence(records),
            other => Payload::Single(other),
        }
    }
}

impl From<Vec<Value>> for Payload<'_> {
    fn from(records: Vec<Value>) -> Self {
        Payload::Sequence(records)
    }
}

impl From<String> for Payload<'_> {
    fn from(text: String) -> Self {
        Payload::Raw(text)
    }
}

impl From<&str> for Payload<'_> {
    fn from(text: &str) -> Self {
        Payload::Raw(text.to_string())
    }
}

/// Iterator over the chunks of a sequence payload.
pub struct Chunks<'a> {
    source: Box<dyn Iterator<Item = Value> + 'a>,
    size: usize,
}

impl fmt::Debug for Chunks<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chunks").field("size", &self.size).finish_non_exhaustive()
    }
}

impl Iterator for Chunks<'_> {
    type Item = Vec<Value>;

    fn next(&mut self) -> Option<Vec<Value>> {
        let chunk: Vec<Value> = self.source.by_ref().take(self.size).collect();
        if chunk.is_empty() {
            None
        } else {
            Some(chunk)
        }
    }
}
