//! Core data types and error definitions for the processing pipeline.

use crate::config::ConfigError;
use crate::embedding::EmbeddingClientError;
use crate::milvus::{LoadState, MilvusError};
use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while configuring the text splitter.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChunkingError {
    /// A chunk must hold at least one character.
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,
    /// Overlap must leave room for new text in every chunk.
    #[error("chunk overlap ({overlap}) must be smaller than chunk size ({chunk_size})")]
    OverlapTooLarge {
        /// Requested overlap.
        overlap: usize,
        /// Requested chunk size.
        chunk_size: usize,
    },
}

/// Errors raised while reading text out of a document.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// File could not be read.
    #[error("failed to read document: {0}")]
    Io(#[from] std::io::Error),
    /// Text extraction rejected the file.
    #[error("failed to extract PDF text: {0}")]
    Pdf(String),
    /// Extraction worker terminated abnormally.
    #[error("extraction worker failed: {0}")]
    Worker(String),
}

/// Errors emitted by the document processing pipeline.
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// Connection parameters or settings were missing or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    /// Splitter parameters were rejected.
    #[error("Invalid chunking parameters: {0}")]
    Chunking(#[from] ChunkingError),
    /// Input document does not exist.
    #[error("PDF file not found at {}", .0.display())]
    NotFound(PathBuf),
    /// Text extraction failed.
    #[error("Failed to load document: {0}")]
    Loader(#[from] LoaderError),
    /// Embedding provider failed to produce vectors for the input text.
    #[error("Failed to generate embeddings: {0}")]
    Embedding(#[from] EmbeddingClientError),
    /// Milvus rejected a request.
    #[error("Vector store request failed: {0}")]
    VectorStore(#[from] MilvusError),
}

/// Coarse failure classes used to choose a response for a failed ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Missing or invalid configuration; detected before calling dependencies.
    Configuration,
    /// Malformed or unacceptable input.
    Validation,
    /// Referenced file or object does not exist.
    NotFound,
    /// An external collaborator (storage, PDF parser, embeddings, vector store) failed.
    Dependency,
}

impl ProcessingError {
    /// Classify the error.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Config(_) | Self::Chunking(_) => FailureKind::Configuration,
            Self::NotFound(_) => FailureKind::NotFound,
            Self::Loader(_) | Self::Embedding(_) | Self::VectorStore(_) => FailureKind::Dependency,
        }
    }
}

/// A chunk of document text paired with its embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedChunk {
    /// Chunk text.
    pub text: String,
    /// Embedding produced for the chunk.
    pub vector: Vec<f32>,
}

/// Summary of a completed ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestOutcome {
    /// Number of chunks produced for the document.
    pub chunk_count: usize,
    /// Number of rows the store reported as inserted.
    pub inserted: usize,
    /// Collection load state observed after the insert, when the query succeeded.
    pub load_state: Option<LoadState>,
}
