#![deny(missing_docs)]

//! Core library for the PDF ingestion pipeline: Milvus schema management, document
//! processing, ingestion, and the event-triggered handler.

/// Webhook routing for event-triggered ingestion.
pub mod api;
/// Collection provisioning and teardown.
pub mod collections;
/// Environment-driven configuration management.
pub mod config;
/// Embedding client abstraction and adapters.
pub mod embedding;
/// Object-created event handling.
pub mod handler;
/// Structured logging and tracing setup.
pub mod logging;
/// Ingestion metrics helpers.
pub mod metrics;
/// Milvus / Zilliz Cloud vector store integration.
pub mod milvus;
/// Document processing pipeline utilities.
pub mod processing;
/// Object storage access.
pub mod storage;
