//! Document processing pipeline: extraction, chunking, embedding, and ingestion.

pub mod chunking;
pub mod loader;
pub mod processor;
mod service;
pub mod types;

pub use chunking::{TextSplitter, join_pages};
pub use loader::{DocumentLoader, PdfLoader};
pub use processor::DocumentProcessor;
pub use service::IngestionService;
pub use types::{
    ChunkingError, EmbeddedChunk, FailureKind, IngestOutcome, LoaderError, ProcessingError,
};
