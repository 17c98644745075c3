//! Shared types used by the Milvus client.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Milvus status code reported for a missing collection.
const COLLECTION_NOT_FOUND_CODE: i64 = 100;

/// Errors returned while interacting with Milvus.
#[derive(Debug, Error)]
pub enum MilvusError {
    /// Base URL failed to parse or normalize.
    #[error("Invalid Milvus URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Milvus responded with a non-success HTTP status.
    #[error("Unexpected Milvus response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned from Milvus.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
    /// Milvus accepted the request but reported a failure in its envelope.
    #[error("Milvus error {code}: {message}")]
    Api {
        /// Store-specific error code.
        code: i64,
        /// Human readable description supplied by the store.
        message: String,
    },
    /// Response envelope lacked the expected payload.
    #[error("Malformed Milvus response: {0}")]
    MalformedResponse(String),
    /// The addressed collection does not exist in the store.
    #[error("collection not found[collection={0}]")]
    CollectionNotFound(String),
}

impl MilvusError {
    /// Whether the store reported that the addressed collection does not exist.
    pub fn is_collection_not_found(&self) -> bool {
        match self {
            Self::Api { code, message } => {
                *code == COLLECTION_NOT_FOUND_CODE
                    || message.to_lowercase().contains("collection not found")
            }
            Self::CollectionNotFound(_) => true,
            _ => false,
        }
    }
}

/// Store-reported availability of a collection for similarity queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadState {
    /// Collection does not exist.
    #[serde(rename = "LoadStateNotExist")]
    NotExist,
    /// Collection exists but is not loaded into memory.
    #[serde(rename = "LoadStateNotLoad")]
    NotLoad,
    /// Collection is being loaded.
    #[serde(rename = "LoadStateLoading")]
    Loading,
    /// Collection is queryable.
    #[serde(rename = "LoadStateLoaded")]
    Loaded,
    /// Any state this client does not recognize.
    #[serde(other)]
    Unknown,
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NotExist => "NotExist",
            Self::NotLoad => "NotLoad",
            Self::Loading => "Loading",
            Self::Loaded => "Loaded",
            Self::Unknown => "Unknown",
        };
        f.write_str(label)
    }
}

/// Field definition read back from a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescription {
    /// Field name.
    pub name: String,
    /// Store data type name (`Int64`, `VarChar`, `FloatVector`, ...).
    pub data_type: String,
    /// Whether the field is the primary key.
    pub primary_key: bool,
    /// Whether the store assigns values for this field.
    pub auto_id: bool,
    /// Vector dimension, for vector fields.
    pub dimension: Option<usize>,
    /// Maximum length, for variable-length text fields.
    pub max_length: Option<usize>,
}

/// Index definition read back from a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDescription {
    /// Indexed field.
    pub field_name: String,
    /// Index name.
    pub index_name: String,
    /// Similarity metric.
    pub metric_type: String,
}

/// Collection layout read back from Milvus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionDescription {
    /// Collection name.
    pub name: String,
    /// Whether rows may carry fields outside the schema.
    pub enable_dynamic_field: bool,
    /// Declared fields in schema order.
    pub fields: Vec<FieldDescription>,
    /// Declared indexes.
    pub indexes: Vec<IndexDescription>,
    /// Load state reported alongside the description, when present.
    pub load_state: Option<LoadState>,
}

impl CollectionDescription {
    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescription> {
        self.fields.iter().find(|field| field.name == name)
    }
}

/// Outcome of a batch insert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertSummary {
    /// Number of rows the store reports as inserted.
    pub insert_count: usize,
}

#[derive(Deserialize)]
pub(crate) struct ApiResponse<T> {
    pub(crate) code: i64,
    pub(crate) message: Option<String>,
    pub(crate) data: Option<T>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawCollectionDescription {
    pub(crate) collection_name: String,
    #[serde(default)]
    pub(crate) enable_dynamic_field: bool,
    #[serde(default)]
    pub(crate) fields: Vec<RawField>,
    #[serde(default)]
    pub(crate) indexes: Vec<RawIndex>,
    #[serde(default)]
    pub(crate) load: Option<LoadState>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawField {
    pub(crate) name: String,
    #[serde(rename = "type")]
    pub(crate) data_type: String,
    #[serde(default)]
    pub(crate) primary_key: bool,
    #[serde(default)]
    pub(crate) auto_id: bool,
    #[serde(default)]
    pub(crate) params: Vec<RawFieldParam>,
}

#[derive(Deserialize)]
pub(crate) struct RawFieldParam {
    pub(crate) key: String,
    pub(crate) value: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawIndex {
    pub(crate) field_name: String,
    #[serde(default)]
    pub(crate) index_name: String,
    #[serde(default)]
    pub(crate) metric_type: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoadStateData {
    pub(crate) load_state: LoadState,
}

#[derive(Deserialize)]
pub(crate) struct HasCollectionData {
    pub(crate) has: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InsertData {
    #[serde(default)]
    pub(crate) insert_count: usize,
}

impl RawField {
    fn param_usize(&self, key: &str) -> Option<usize> {
        self.params
            .iter()
            .find(|param| param.key == key)
            .and_then(|param| match &param.value {
                Value::String(text) => text.parse().ok(),
                Value::Number(number) => number.as_u64().map(|value| value as usize),
                _ => None,
            })
    }
}

impl From<RawCollectionDescription> for CollectionDescription {
    fn from(raw: RawCollectionDescription) -> Self {
        let fields = raw
            .fields
            .into_iter()
            .map(|field| FieldDescription {
                dimension: field.param_usize("dim"),
                max_length: field.param_usize("max_length"),
                name: field.name,
                data_type: field.data_type,
                primary_key: field.primary_key,
                auto_id: field.auto_id,
            })
            .collect();
        let indexes = raw
            .indexes
            .into_iter()
            .map(|index| IndexDescription {
                field_name: index.field_name,
                index_name: index.index_name,
                metric_type: index.metric_type,
            })
            .collect();

        Self {
            name: raw.collection_name,
            enable_dynamic_field: raw.enable_dynamic_field,
            fields,
            indexes,
            load_state: raw.load,
        }
    }
}
