//! Object-created notification parsing.

use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;

/// Errors raised for events that cannot be acted upon.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventError {
    /// `Records` is absent, null, or empty.
    #[error("No records found in event")]
    NoRecords,
    /// `Records` is present but not a list.
    #[error("Event field `Records` must be a list")]
    InvalidRecords,
    /// A record lacks the bucket name or object key.
    #[error("Malformed record at index {index}: {reason}")]
    MalformedRecord {
        /// Position of the record in `Records`.
        index: usize,
        /// What was wrong with it.
        reason: String,
    },
}

/// Bucket and key of an object referenced by a notification record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    /// Bucket the object lives in.
    pub bucket: String,
    /// Object key, used verbatim.
    pub key: String,
}

#[derive(Deserialize)]
struct EventRecord {
    s3: S3Entity,
}

#[derive(Deserialize)]
struct S3Entity {
    bucket: S3Bucket,
    object: S3Object,
}

#[derive(Deserialize)]
struct S3Bucket {
    name: String,
}

#[derive(Deserialize)]
struct S3Object {
    key: String,
}

/// Extract every referenced object from a notification, in record order.
///
/// Fields other than `s3.bucket.name` and `s3.object.key` are ignored.
pub fn parse_targets(event: &Value) -> Result<Vec<ObjectRef>, EventError> {
    let records = match event.get("Records") {
        None | Some(Value::Null) => return Err(EventError::NoRecords),
        Some(Value::Array(records)) if records.is_empty() => return Err(EventError::NoRecords),
        Some(Value::Array(records)) => records,
        Some(_) => return Err(EventError::InvalidRecords),
    };

    records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let parsed = EventRecord::deserialize(record).map_err(|err| malformed(index, err))?;
            if parsed.s3.object.key.is_empty() {
                return Err(malformed(index, "object key is empty"));
            }
            Ok(ObjectRef {
                bucket: parsed.s3.bucket.name,
                key: parsed.s3.object.key,
            })
        })
        .collect()
}

fn malformed(index: usize, reason: impl ToString) -> EventError {
    EventError::MalformedRecord {
        index,
        reason: reason.to_string(),
    }
}

/// Build a minimal single-record object-created notification.
pub fn object_created_event(bucket: &str, key: &str) -> Value {
    json!({
        "Records": [{
            "eventName": "ObjectCreated:Put",
            "s3": {
                "bucket": { "name": bucket },
                "object": { "key": key }
            }
        }]
    })
}
