//! JSON encoding of request bodies and gzip compression of large payloads.

use std::io::Write;

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Timelike};
use flate2::{Compression, GzBuilder};
use serde::{Serialize, Serializer};

use crate::error::{ClientError, Result};

/// Bodies longer than this many bytes are gzipped when compression is on.
pub const GZIP_THRESHOLD: usize = 2048;

/// A point in time rendered as ISO-8601 with an explicit UTC offset.
///
/// Naive datetimes are taken to be UTC. Use it inside `serde_json::json!`
/// or through [`iso8601`] on record fields:
///
/// ```
/// use chrono::NaiveDate;
/// use pp_client::Timestamp;
///
/// let day = NaiveDate::from_ymd_opt(2012, 12, 12).unwrap().and_hms_opt(0, 0, 0).unwrap();
/// let record = serde_json::json!({ "_timestamp": Timestamp::from(day) });
/// assert_eq!(record["_timestamp"], "2012-12-12T00:00:00+00:00");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    Naive(NaiveDateTime),
    Aware(DateTime<FixedOffset>),
}

impl Timestamp {
    /// Seconds precision, or six fractional digits when the value has a
    /// non-zero microsecond part. Nanoseconds below a microsecond are dropped.
    pub fn to_iso8601(&self) -> String {
        let aware = match self {
            Timestamp::Naive(naive) => naive.and_utc().fixed_offset(),
            Timestamp::Aware(aware) => *aware,
        };
        if aware.nanosecond() / 1_000 == 0 {
            aware.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
        } else {
            aware.format("%Y-%m-%dT%H:%M:%S%.6f%:z").to_string()
        }
    }
}

impl From<NaiveDateTime> for Timestamp {
    fn from(value: NaiveDateTime) -> Self {
        Timestamp::Naive(value)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Timestamp {
    fn from(value: DateTime<Tz>) -> Self {
        Timestamp::Aware(value.fixed_offset())
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_iso8601())
    }
}

/// `#[serde(serialize_with = "pp_client::encode::iso8601::serialize")]` for
/// `NaiveDateTime` and `DateTime<Tz>` fields.
pub mod iso8601 {
    use serde::{Serialize, Serializer};

    use super::Timestamp;

    pub fn serialize<S, T>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Clone + Into<Timestamp>,
    {
        value.clone().into().serialize(serializer)
    }
}

/// Encodes `data` as compact JSON.
pub fn encode_json<T: Serialize + ?Sized>(data: &T) -> Result<String> {
    serde_json::to_string(data).map_err(ClientError::Serialization)
}

/// Gzips `data` with an empty file name and a zero modification time, so the
/// same input always yields the same bytes.
pub fn gzip(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzBuilder::new()
        .mtime(0)
        .write(Vec::with_capacity(data.len() / 4), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Whether a serialized body of `len` bytes should be sent gzipped.
pub fn should_gzip(len: usize, enabled: bool) -> bool {
    enabled && len > GZIP_THRESHOLD
}
