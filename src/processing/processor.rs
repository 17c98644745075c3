//! Document processor: load, split, and embed a single file.

use super::chunking::{TextSplitter, join_pages};
use super::loader::{DocumentLoader, PdfLoader};
use super::types::{EmbeddedChunk, ProcessingError};
use crate::config::Config;
use crate::embedding::{EmbeddingClient, get_embedding_client};
use std::path::Path;

/// Turns a document on disk into an ordered sequence of embedded chunks.
///
/// Chunks are embedded sequentially, `batch_size` chunks per provider call (one by default),
/// and the output preserves chunk order.
pub struct DocumentProcessor {
    loader: Box<dyn DocumentLoader>,
    embedding_client: Box<dyn EmbeddingClient>,
    batch_size: usize,
}

impl DocumentProcessor {
    /// Build a processor from explicit collaborators, embedding one chunk per call.
    pub fn new(
        loader: Box<dyn DocumentLoader>,
        embedding_client: Box<dyn EmbeddingClient>,
    ) -> Self {
        Self {
            loader,
            embedding_client,
            batch_size: 1,
        }
    }

    /// Build a PDF processor using the configured embedding provider.
    pub fn from_config(config: &Config) -> Result<Self, ProcessingError> {
        let embedding_client = get_embedding_client(config)?;
        Ok(Self::new(Box::new(PdfLoader), embedding_client)
            .with_batch_size(config.embedding_batch_size))
    }

    /// Number of chunks sent per embedding request.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Load, split, and embed the document at `path`.
    pub async fn process_document(
        &self,
        path: &Path,
        splitter: &TextSplitter,
    ) -> Result<Vec<EmbeddedChunk>, ProcessingError> {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Err(ProcessingError::NotFound(path.to_path_buf()));
        }

        let pages = self.loader.load_pages(path).await?;
        let chunks = splitter.split(&join_pages(&pages));
        tracing::info!(
            path = %path.display(),
            pages = pages.len(),
            chunks = chunks.len(),
            chunk_size = splitter.chunk_size(),
            chunk_overlap = splitter.chunk_overlap(),
            "Split document"
        );

        self.embed_chunks(chunks).await
    }

    /// Embed already split chunks, preserving order.
    pub async fn embed_chunks(
        &self,
        chunks: Vec<String>,
    ) -> Result<Vec<EmbeddedChunk>, ProcessingError> {
        let mut embedded = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(self.batch_size) {
            let vectors = self
                .embedding_client
                .generate_embeddings(batch.to_vec())
                .await?;
            embedded.extend(
                batch
                    .iter()
                    .cloned()
                    .zip(vectors)
                    .map(|(text, vector)| EmbeddedChunk { text, vector }),
            );
        }
        tracing::debug!(chunks = embedded.len(), "Generated embeddings");
        Ok(embedded)
    }
}
