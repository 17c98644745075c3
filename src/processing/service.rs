//! Ingestion orchestrator: process a document and persist its chunks.

use crate::{
    config::{Config, ConnectionParams},
    metrics::IngestMetrics,
    milvus::{DocumentRecord, MilvusClient},
    processing::{
        chunking::TextSplitter,
        processor::DocumentProcessor,
        types::{EmbeddedChunk, IngestOutcome, ProcessingError},
    },
};
use std::path::Path;
use std::sync::Arc;

/// Coordinates document processing with writes to the vector store.
///
/// The service owns the processor, the Milvus transport, and the metrics registry so the CLI,
/// the event handler, and the webhook share the same components. Build it once per target
/// store and share it through an `Arc` when several surfaces need it.
pub struct IngestionService {
    processor: DocumentProcessor,
    milvus: MilvusClient,
    metrics: Arc<IngestMetrics>,
}

impl IngestionService {
    /// Assemble a service from explicit collaborators.
    pub fn new(processor: DocumentProcessor, milvus: MilvusClient) -> Self {
        Self {
            processor,
            milvus,
            metrics: Arc::new(IngestMetrics::new()),
        }
    }

    /// Build the PDF pipeline for the store described by `params`.
    pub fn from_config(
        config: &Config,
        params: &ConnectionParams,
    ) -> Result<Self, ProcessingError> {
        let processor = DocumentProcessor::from_config(config)?;
        let milvus = MilvusClient::from_params(params)?;
        Ok(Self::new(processor, milvus))
    }

    /// Share an existing metrics registry instead of the service's own.
    pub fn with_metrics(mut self, metrics: Arc<IngestMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Document processor used by this service.
    pub fn processor(&self) -> &DocumentProcessor {
        &self.processor
    }

    /// Metrics registry updated after each ingestion.
    pub fn metrics(&self) -> Arc<IngestMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Process the file at `path` and insert its chunks into `collection_name`.
    ///
    /// The file name is stored alongside every row as its source.
    pub async fn insert_document(
        &self,
        path: &Path,
        collection_name: &str,
        splitter: &TextSplitter,
    ) -> Result<IngestOutcome, ProcessingError> {
        tracing::info!(
            path = %path.display(),
            collection = collection_name,
            "Ingesting document"
        );
        let chunks = self.processor.process_document(path, splitter).await?;
        let source = path.file_name().map(|name| name.to_string_lossy());
        self.insert_chunks(collection_name, chunks, source.as_deref())
            .await
    }

    /// Insert already embedded chunks as one batch, then report the collection load state.
    ///
    /// An empty chunk list skips the insert. A failed load-state query is logged and reported
    /// as `None`; it never fails an insert that already succeeded.
    pub async fn insert_chunks(
        &self,
        collection_name: &str,
        chunks: Vec<EmbeddedChunk>,
        source: Option<&str>,
    ) -> Result<IngestOutcome, ProcessingError> {
        let chunk_count = chunks.len();
        if chunk_count == 0 {
            tracing::warn!(
                collection = collection_name,
                source,
                "Document produced no chunks; nothing inserted"
            );
            return Ok(IngestOutcome {
                chunk_count,
                inserted: 0,
                load_state: None,
            });
        }

        let records: Vec<DocumentRecord> = chunks
            .into_iter()
            .map(|chunk| DocumentRecord {
                text: chunk.text,
                vector: chunk.vector,
                source: source.map(str::to_string),
            })
            .collect();
        let summary = self.milvus.insert(collection_name, &records).await?;
        let inserted = summary.insert_count;

        let load_state = match self.milvus.get_load_state(collection_name).await {
            Ok(state) => Some(state),
            Err(error) => {
                tracing::warn!(
                    collection = collection_name,
                    error = %error,
                    "Failed to query load state after insert"
                );
                None
            }
        };

        self.metrics.record_document(inserted as u64);
        tracing::info!(
            collection = collection_name,
            source,
            chunks = chunk_count,
            inserted,
            load_state = ?load_state,
            "Document ingested"
        );

        Ok(IngestOutcome {
            chunk_count,
            inserted,
            load_state,
        })
    }
}
