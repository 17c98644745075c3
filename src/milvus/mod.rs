//! Milvus / Zilliz Cloud vector store integration.

pub mod client;
pub mod schema;
pub mod types;

pub use client::MilvusClient;
pub use schema::{DocumentRecord, document_schema, vector_index};
pub use types::{
    CollectionDescription, FieldDescription, IndexDescription, InsertSummary, LoadState,
    MilvusError,
};
