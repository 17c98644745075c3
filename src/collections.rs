//! Collection provisioning and teardown.
//!
//! These operations run out of band from ingestion: operators create the target collection
//! before any document is inserted and drop it to reclaim storage. Connection parameters are
//! resolved by the caller through [`ConnectionParams::resolve`], so a missing name, URI, or
//! token fails before any request is sent.

use crate::config::ConnectionParams;
use crate::milvus::{
    CollectionDescription, MilvusClient, MilvusError, document_schema, vector_index,
};

/// Create the document collection with a vector field of `dimension` components.
///
/// Creating a collection whose name is already taken fails with the store's conflict error.
pub async fn create_collection(
    params: &ConnectionParams,
    dimension: usize,
) -> Result<(), MilvusError> {
    let client = MilvusClient::from_params(params)?;
    client
        .create_collection(
            &params.collection_name,
            &document_schema(dimension),
            &[vector_index()],
        )
        .await?;
    tracing::info!(
        collection = %params.collection_name,
        dimension,
        "Collection created"
    );
    Ok(())
}

/// Drop the collection; dropping a missing collection is an error.
pub async fn drop_collection(params: &ConnectionParams) -> Result<(), MilvusError> {
    let client = MilvusClient::from_params(params)?;
    client.drop_collection(&params.collection_name).await?;
    tracing::info!(collection = %params.collection_name, "Collection dropped");
    Ok(())
}

/// Read back the collection's fields and indexes.
pub async fn describe_collection(
    params: &ConnectionParams,
) -> Result<CollectionDescription, MilvusError> {
    let client = MilvusClient::from_params(params)?;
    client.describe_collection(&params.collection_name).await
}

/// Whether the configured collection exists.
pub async fn collection_exists(params: &ConnectionParams) -> Result<bool, MilvusError> {
    let client = MilvusClient::from_params(params)?;
    client.has_collection(&params.collection_name).await
}

/// List every collection visible to the configured credentials.
pub async fn list_collections(params: &ConnectionParams) -> Result<Vec<String>, MilvusError> {
    let client = MilvusClient::from_params(params)?;
    client.list_collections().await
}
