//! Event-triggered ingestion: object-created notification in, status response out.
//!
//! An invocation moves through `validating → downloading → processing → inserting →
//! cleaning_up → done`, falling to `failed` from any stage. Nothing is retried. Every
//! referenced bucket is checked before the first download, then each record is ingested in
//! order with its own scratch directory.

pub mod event;
pub mod scratch;

use crate::{
    config::{Config, ConfigError, ConnectionParams},
    metrics::IngestMetrics,
    processing::{FailureKind, IngestOutcome, IngestionService, ProcessingError, TextSplitter},
    storage::s3_store,
};
use event::{EventError, ObjectRef, parse_targets};
use object_store::ObjectStore;
use scratch::ScratchDir;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Failures surfaced by a handler invocation.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Required settings were missing or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    /// Object storage client could not be built.
    #[error("Failed to initialize object storage: {0}")]
    Storage(#[source] object_store::Error),
    /// The event itself was unusable.
    #[error(transparent)]
    Event(#[from] EventError),
    /// A record referenced a bucket other than the configured one.
    #[error("Invalid bucket. Expected {expected}, got {actual}")]
    BucketMismatch {
        /// Configured bucket.
        expected: String,
        /// Bucket named by the record.
        actual: String,
    },
    /// Referenced object does not exist.
    #[error("Object {key} not found")]
    ObjectNotFound {
        /// Object key.
        key: String,
        /// Store error.
        #[source]
        source: object_store::Error,
    },
    /// Object could not be fetched.
    #[error("Failed to download {key}: {source}")]
    Download {
        /// Object key.
        key: String,
        /// Store error.
        #[source]
        source: object_store::Error,
    },
    /// Local scratch storage failed.
    #[error("Scratch storage error: {0}")]
    Scratch(#[from] std::io::Error),
    /// Processing or insertion failed.
    #[error(transparent)]
    Processing(#[from] ProcessingError),
}

impl HandlerError {
    pub(crate) fn download(key: &str, source: object_store::Error) -> Self {
        match source {
            object_store::Error::NotFound { .. } => Self::ObjectNotFound {
                key: key.to_string(),
                source,
            },
            source => Self::Download {
                key: key.to_string(),
                source,
            },
        }
    }

    /// Classify the failure.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Config(_) | Self::Storage(_) => FailureKind::Configuration,
            Self::Event(_) | Self::BucketMismatch { .. } => FailureKind::Validation,
            Self::ObjectNotFound { .. } => FailureKind::NotFound,
            Self::Download { .. } | Self::Scratch(_) => FailureKind::Dependency,
            Self::Processing(error) => error.kind(),
        }
    }

    /// HTTP-style status reported for this failure.
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            FailureKind::Validation => 400,
            _ => 500,
        }
    }
}

/// Invocation result in the `{statusCode, body}` shape; `body` is a JSON-encoded string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerResponse {
    /// 200, 400 or 500.
    pub status_code: u16,
    /// JSON string literal carrying the message.
    pub body: String,
}

impl HandlerResponse {
    fn new(status_code: u16, message: &str) -> Self {
        Self {
            status_code,
            body: Value::String(message.to_string()).to_string(),
        }
    }

    /// Decoded message carried by `body`.
    pub fn message(&self) -> Option<String> {
        serde_json::from_str(&self.body).ok()
    }
}

/// Per-process settings read by every invocation.
#[derive(Debug, Clone)]
pub struct HandlerSettings {
    /// Only objects from this bucket are accepted.
    pub expected_bucket: String,
    /// Collection receiving the records.
    pub collection_name: String,
    /// Splitter applied to every document.
    pub splitter: TextSplitter,
    /// Parent of the per-object scratch directories.
    pub scratch_root: PathBuf,
}

impl HandlerSettings {
    /// Derive settings from configuration and resolved connection parameters.
    pub fn from_config(config: &Config, params: &ConnectionParams) -> Result<Self, HandlerError> {
        let expected_bucket = config.require_bucket()?.to_string();
        let splitter = TextSplitter::new(config.chunk_size, config.chunk_overlap)
            .map_err(ProcessingError::from)?;
        Ok(Self {
            expected_bucket,
            collection_name: params.collection_name.clone(),
            splitter,
            scratch_root: config.scratch_dir.clone(),
        })
    }
}

/// Long-lived clients and settings shared by all invocations.
///
/// Build it once at startup; it is immutable afterwards and can be shared through an `Arc`.
pub struct HandlerContext {
    service: IngestionService,
    store: Arc<dyn ObjectStore>,
    settings: HandlerSettings,
}

impl HandlerContext {
    /// Assemble a context from explicit collaborators.
    pub fn new(
        service: IngestionService,
        store: Arc<dyn ObjectStore>,
        settings: HandlerSettings,
    ) -> Self {
        Self {
            service,
            store,
            settings,
        }
    }

    /// Build the production context: S3 storage, configured embeddings, Milvus REST.
    pub fn from_config(config: &Config) -> Result<Self, HandlerError> {
        let params = ConnectionParams::resolve(None, None, None, config)?;
        let settings = HandlerSettings::from_config(config, &params)?;
        let store = s3_store(&settings.expected_bucket).map_err(HandlerError::Storage)?;
        let service = IngestionService::from_config(config, &params)?;
        tracing::info!(
            bucket = %settings.expected_bucket,
            collection = %settings.collection_name,
            scratch_root = %settings.scratch_root.display(),
            "Handler context initialized"
        );
        Ok(Self::new(service, store, settings))
    }

    /// Settings in effect.
    pub fn settings(&self) -> &HandlerSettings {
        &self.settings
    }

    /// Ingestion counters.
    pub fn metrics(&self) -> Arc<IngestMetrics> {
        self.service.metrics()
    }
}

#[derive(Debug, Clone, Copy)]
enum Stage {
    Validating,
    Downloading,
    Processing,
    Inserting,
    CleaningUp,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Validating => "validating",
            Self::Downloading => "downloading",
            Self::Processing => "processing",
            Self::Inserting => "inserting",
            Self::CleaningUp => "cleaning_up",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Run one invocation for `event`.
///
/// Never fails: every error becomes a 400 or 500 response and is logged with its source chain.
///
/// Records are committed one at a time and nothing is rolled back. When record N fails, the
/// rows of records `0..N` are already in the collection; the failure body lists those keys
/// after `already processed:` so a caller can avoid resubmitting them.
#[tracing::instrument(skip_all, fields(invocation_id = %Uuid::new_v4()))]
pub async fn handle(context: &HandlerContext, event: Value) -> HandlerResponse {
    tracing::debug!(event = %event, "Received event");
    let mut processed = Vec::new();
    match process_event(context, &event, &mut processed).await {
        Ok(()) => {
            let message = format!("Successfully processed {}", processed.join(", "));
            tracing::info!(stage = %Stage::Done, objects = processed.len(), "{message}");
            HandlerResponse::new(200, &message)
        }
        Err(error) => {
            let status = error.status_code();
            let kind = error.kind();
            if status == 400 {
                tracing::warn!(stage = %Stage::Failed, ?kind, status, "{error}");
            } else {
                tracing::error!(
                    stage = %Stage::Failed,
                    ?kind,
                    status,
                    chain = %error_chain(&error),
                    "Error processing document"
                );
            }
            context.metrics().record_failure();
            let message = if processed.is_empty() {
                error.to_string()
            } else {
                tracing::warn!(committed = ?processed, "Invocation failed after partial ingestion");
                format!("{error} (already processed: {})", processed.join(", "))
            };
            HandlerResponse::new(status, &message)
        }
    }
}

/// Keys are pushed to `processed` as soon as their records are inserted.
async fn process_event(
    context: &HandlerContext,
    event: &Value,
    processed: &mut Vec<String>,
) -> Result<(), HandlerError> {
    tracing::info!(stage = %Stage::Validating, "Validating event");
    let targets = parse_targets(event)?;
    let expected = &context.settings.expected_bucket;
    if let Some(target) = targets.iter().find(|target| &target.bucket != expected) {
        return Err(HandlerError::BucketMismatch {
            expected: expected.clone(),
            actual: target.bucket.clone(),
        });
    }

    for target in targets {
        process_object(context, &target).await?;
        processed.push(target.key);
    }
    Ok(())
}

async fn process_object(
    context: &HandlerContext,
    object: &ObjectRef,
) -> Result<IngestOutcome, HandlerError> {
    let settings = &context.settings;
    let scratch = ScratchDir::create(&settings.scratch_root)?;

    tracing::info!(
        stage = %Stage::Downloading,
        bucket = %object.bucket,
        key = %object.key,
        "Downloading object"
    );
    let local_path = scratch.download(context.store.as_ref(), object).await?;

    tracing::info!(
        stage = %Stage::Processing,
        path = %local_path.display(),
        "Loading and splitting document"
    );
    let chunks = context
        .service
        .processor()
        .process_document(&local_path, &settings.splitter)
        .await?;

    tracing::info!(
        stage = %Stage::Inserting,
        chunks = chunks.len(),
        collection = %settings.collection_name,
        "Inserting records"
    );
    let outcome = context
        .service
        .insert_chunks(&settings.collection_name, chunks, Some(object.key.as_str()))
        .await?;

    tracing::debug!(
        stage = %Stage::CleaningUp,
        path = %scratch.path().display(),
        "Removing scratch directory"
    );
    if let Err(error) = scratch.close() {
        tracing::warn!(error = %error, "Failed to remove scratch directory");
    }
    Ok(outcome)
}

/// Join an error with its causes, skipping a cause whose text the message already ends with.
fn error_chain(error: &dyn std::error::Error) -> String {
    let mut chain = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !chain.ends_with(&text) {
            chain.push_str(": ");
            chain.push_str(&text);
        }
        source = cause.source();
    }
    chain
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::handler::event::object_created_event;
    use crate::milvus::MilvusClient;
    use crate::processing::DocumentProcessor;
    use crate::processing::processor::tests::{RecordingEmbedder, StaticLoader};
    use httpmock::{Method::POST, Mock, MockServer};
    use object_store::memory::InMemory;
    use object_store::{PutPayload, path::Path as ObjectPath};
    use serde_json::json;

    /// Context backed by an in-memory bucket `inbox`, stub extraction and a mock Milvus.
    pub(crate) struct Harness {
        pub(crate) context: Arc<HandlerContext>,
        pub(crate) server: MockServer,
        scratch_root: tempfile::TempDir,
    }

    impl Harness {
        pub(crate) async fn new(objects: &[&str]) -> Self {
            let server = MockServer::start_async().await;
            let store = InMemory::new();
            for key in objects {
                store
                    .put(
                        &ObjectPath::from(*key),
                        PutPayload::from(b"%PDF-1.4".to_vec()),
                    )
                    .await
                    .expect("seed object");
            }
            let processor = DocumentProcessor::new(
                Box::new(StaticLoader(vec!["abcdefghij".into()])),
                Box::new(RecordingEmbedder::default()),
            );
            let milvus = MilvusClient::new(&server.base_url(), "test-token").expect("milvus");
            let scratch_root = tempfile::tempdir().expect("scratch root");
            let settings = HandlerSettings {
                expected_bucket: "inbox".into(),
                collection_name: "docs".into(),
                splitter: TextSplitter::new(6, 2).unwrap(),
                scratch_root: scratch_root.path().to_path_buf(),
            };
            let context = Arc::new(HandlerContext::new(
                IngestionService::new(processor, milvus),
                Arc::new(store),
                settings,
            ));
            Self {
                context,
                server,
                scratch_root,
            }
        }

        pub(crate) async fn accept_inserts(&self) -> Mock<'_> {
            self.server
                .mock_async(|when, then| {
                    when.method(POST)
                        .path("/v2/vectordb/collections/get_load_state");
                    then.status(200).json_body(json!({
                        "code": 0,
                        "data": { "loadState": "LoadStateLoaded" }
                    }));
                })
                .await;
            self.server
                .mock_async(|when, then| {
                    when.method(POST).path("/v2/vectordb/entities/insert");
                    then.status(200)
                        .json_body(json!({ "code": 0, "data": { "insertCount": 2 } }));
                })
                .await
        }

        fn scratch_entries(&self) -> usize {
            std::fs::read_dir(self.scratch_root.path())
                .expect("scratch root")
                .count()
        }
    }

    #[tokio::test]
    async fn valid_event_is_ingested() {
        let harness = Harness::new(&["uploads/report.pdf"]).await;
        let insert = harness.accept_inserts().await;

        let response = handle(
            &harness.context,
            object_created_event("inbox", "uploads/report.pdf"),
        )
        .await;

        assert_eq!(response.status_code, 200);
        assert_eq!(
            response.body,
            "\"Successfully processed uploads/report.pdf\""
        );
        insert.assert_async().await;
        assert_eq!(harness.scratch_entries(), 0);
        let snapshot = harness.context.metrics().snapshot();
        assert_eq!(snapshot.documents_ingested, 1);
        assert_eq!(snapshot.failed_invocations, 0);
    }

    #[tokio::test]
    async fn every_record_is_processed_in_order() {
        let harness = Harness::new(&["a.pdf", "b.pdf"]).await;
        let insert = harness.accept_inserts().await;
        let event = json!({
            "Records": [
                { "s3": { "bucket": { "name": "inbox" }, "object": { "key": "a.pdf" } } },
                { "s3": { "bucket": { "name": "inbox" }, "object": { "key": "b.pdf" } } }
            ]
        });

        let response = handle(&harness.context, event).await;

        assert_eq!(response.status_code, 200);
        assert_eq!(
            response.message().as_deref(),
            Some("Successfully processed a.pdf, b.pdf")
        );
        insert.assert_hits_async(2).await;
    }

    #[tokio::test]
    async fn later_failure_reports_already_committed_keys() {
        let harness = Harness::new(&["a.pdf"]).await;
        let insert = harness.accept_inserts().await;
        let event = json!({
            "Records": [
                { "s3": { "bucket": { "name": "inbox" }, "object": { "key": "a.pdf" } } },
                { "s3": { "bucket": { "name": "inbox" }, "object": { "key": "missing.pdf" } } }
            ]
        });

        let response = handle(&harness.context, event).await;

        assert_eq!(response.status_code, 500);
        assert_eq!(
            response.message().as_deref(),
            Some("Object missing.pdf not found (already processed: a.pdf)")
        );
        insert.assert_hits_async(1).await;
        assert_eq!(harness.scratch_entries(), 0);
    }

    #[tokio::test]
    async fn empty_records_are_rejected_without_download() {
        let harness = Harness::new(&[]).await;
        let insert = harness.accept_inserts().await;

        for event in [json!({}), json!({ "Records": [] })] {
            let response = handle(&harness.context, event).await;
            assert_eq!(response.status_code, 400);
            assert_eq!(response.body, "\"No records found in event\"");
        }
        insert.assert_hits_async(0).await;
        assert_eq!(harness.scratch_entries(), 0);
        assert_eq!(harness.context.metrics().snapshot().failed_invocations, 2);
    }

    #[tokio::test]
    async fn foreign_bucket_is_rejected_before_any_download() {
        let harness = Harness::new(&["a.pdf", "b.pdf"]).await;
        let insert = harness.accept_inserts().await;
        let event = json!({
            "Records": [
                { "s3": { "bucket": { "name": "inbox" }, "object": { "key": "a.pdf" } } },
                { "s3": { "bucket": { "name": "elsewhere" }, "object": { "key": "b.pdf" } } }
            ]
        });

        let response = handle(&harness.context, event).await;

        assert_eq!(response.status_code, 400);
        assert_eq!(
            response.message().as_deref(),
            Some("Invalid bucket. Expected inbox, got elsewhere")
        );
        insert.assert_hits_async(0).await;
        assert_eq!(harness.scratch_entries(), 0);
    }

    #[tokio::test]
    async fn malformed_record_is_a_validation_failure() {
        let harness = Harness::new(&[]).await;
        let event = json!({ "Records": [{ "s3": { "bucket": { "name": "inbox" } } }] });

        let response = handle(&harness.context, event).await;
        assert_eq!(response.status_code, 400);
    }

    #[tokio::test]
    async fn missing_object_fails_with_server_error() {
        let harness = Harness::new(&[]).await;
        let insert = harness.accept_inserts().await;

        let event = object_created_event("inbox", "ghost.pdf");
        let response = handle(&harness.context, event).await;

        assert_eq!(response.status_code, 500);
        assert!(response.message().unwrap().contains("ghost.pdf"));
        insert.assert_hits_async(0).await;
        assert_eq!(harness.scratch_entries(), 0);
    }

    #[tokio::test]
    async fn store_failure_returns_500_and_cleans_up() {
        let harness = Harness::new(&["report.pdf"]).await;
        harness
            .server
            .mock_async(|when, then| {
                when.method(POST).path("/v2/vectordb/entities/insert");
                then.status(200).json_body(json!({
                    "code": 100,
                    "message": "collection not found[collection=docs]"
                }));
            })
            .await;

        let event = object_created_event("inbox", "report.pdf");
        let response = handle(&harness.context, event).await;

        assert_eq!(response.status_code, 500);
        assert!(
            response
                .message()
                .unwrap()
                .contains("collection not found")
        );
        assert_eq!(harness.scratch_entries(), 0);
        assert_eq!(harness.context.metrics().snapshot().failed_invocations, 1);
    }

    #[test]
    fn failure_kinds_map_to_status_codes() {
        let mismatch = HandlerError::BucketMismatch {
            expected: "a".into(),
            actual: "b".into(),
        };
        assert_eq!(mismatch.kind(), FailureKind::Validation);
        assert_eq!(mismatch.status_code(), 400);

        let missing = HandlerError::Config(ConfigError::MissingVariable("PDF_BUCKET_NAME".into()));
        assert_eq!(missing.kind(), FailureKind::Configuration);
        assert_eq!(missing.status_code(), 500);

        let not_found = HandlerError::Processing(ProcessingError::NotFound("/tmp/x.pdf".into()));
        assert_eq!(not_found.kind(), FailureKind::NotFound);
        assert_eq!(not_found.status_code(), 500);
    }

    #[test]
    fn response_serializes_in_camel_case() {
        let response = HandlerResponse::new(200, "ok");
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({ "statusCode": 200, "body": "\"ok\"" })
        );
    }

    #[test]
    fn chain_includes_each_source_once() {
        let error = HandlerError::Scratch(std::io::Error::other("disk full"));
        assert_eq!(error_chain(&error), "Scratch storage error: disk full");

        let error = HandlerError::ObjectNotFound {
            key: "ghost.pdf".into(),
            source: object_store::Error::NotFound {
                path: "ghost.pdf".into(),
                source: Box::new(std::io::Error::other("no such key")),
            },
        };
        assert_eq!(
            error_chain(&error),
            "Object ghost.pdf not found: Object at location ghost.pdf not found: no such key"
        );
    }
}
