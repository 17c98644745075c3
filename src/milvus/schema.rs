//! Collection layout for ingested documents.
//!
//! Every collection created by this crate has the same three declared fields plus dynamic
//! fields, and one cosine-similarity index on the vector field whose algorithm is left to
//! the store (`AUTOINDEX`).

use serde::Serialize;
use serde_json::{Map, Value, json};

/// Auto-assigned INT64 primary key.
pub const ID_FIELD: &str = "id";
/// Chunk text.
pub const TEXT_FIELD: &str = "pdf_text";
/// Chunk embedding.
pub const VECTOR_FIELD: &str = "my_vector";
/// Dynamic field naming the document a chunk came from.
pub const SOURCE_FIELD: &str = "source";
/// Maximum characters accepted by the text field.
pub const MAX_TEXT_LENGTH: usize = 65_535;

/// Scalar and vector types used by the document schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DataType {
    /// 64-bit integer.
    Int64,
    /// Variable-length string.
    VarChar,
    /// Fixed-dimension `f32` vector.
    FloatVector,
}

/// Similarity metrics supported by the vector index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MetricType {
    /// Cosine similarity.
    #[serde(rename = "COSINE")]
    Cosine,
}

/// Declared field in a collection schema.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSchema {
    /// Field name.
    pub field_name: String,
    /// Field type.
    pub data_type: DataType,
    /// Whether this field is the primary key.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_primary: bool,
    /// Type parameters such as `dim` or `max_length`.
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub element_type_params: Map<String, Value>,
}

/// Collection schema submitted on creation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSchema {
    /// Store assigns primary keys.
    pub auto_id: bool,
    /// Rows may carry fields beyond the declared ones.
    pub enable_dynamic_field: bool,
    /// Declared fields.
    pub fields: Vec<FieldSchema>,
}

/// Index definition submitted on creation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexParams {
    /// Indexed field.
    pub field_name: String,
    /// Index name.
    pub index_name: String,
    /// Similarity metric.
    pub metric_type: MetricType,
    /// Index algorithm; `AUTOINDEX` lets the store choose.
    pub index_type: String,
}

/// Row inserted for each chunk.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentRecord {
    /// Chunk text.
    #[serde(rename = "pdf_text")]
    pub text: String,
    /// Chunk embedding.
    #[serde(rename = "my_vector")]
    pub vector: Vec<f32>,
    /// Name of the source document, stored as a dynamic field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Build the document schema with a vector field of `dimension` components.
pub fn document_schema(dimension: usize) -> CollectionSchema {
    let mut text_params = Map::new();
    text_params.insert("max_length".into(), json!(MAX_TEXT_LENGTH.to_string()));
    let mut vector_params = Map::new();
    vector_params.insert("dim".into(), json!(dimension.to_string()));

    CollectionSchema {
        auto_id: true,
        enable_dynamic_field: true,
        fields: vec![
            FieldSchema {
                field_name: ID_FIELD.into(),
                data_type: DataType::Int64,
                is_primary: true,
                element_type_params: Map::new(),
            },
            FieldSchema {
                field_name: TEXT_FIELD.into(),
                data_type: DataType::VarChar,
                is_primary: false,
                element_type_params: text_params,
            },
            FieldSchema {
                field_name: VECTOR_FIELD.into(),
                data_type: DataType::FloatVector,
                is_primary: false,
                element_type_params: vector_params,
            },
        ],
    }
}

/// Cosine index on the vector field.
pub fn vector_index() -> IndexParams {
    IndexParams {
        field_name: VECTOR_FIELD.into(),
        index_name: VECTOR_FIELD.into(),
        metric_type: MetricType::Cosine,
        index_type: "AUTOINDEX".into(),
    }
}
