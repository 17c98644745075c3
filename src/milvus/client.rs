//! HTTP client wrapper for the Milvus RESTful API (v2).

use crate::config::ConnectionParams;
use crate::milvus::schema::{CollectionSchema, IndexParams};
use crate::milvus::types::{
    ApiResponse, CollectionDescription, HasCollectionData, InsertData, InsertSummary, LoadState,
    LoadStateData, MilvusError, RawCollectionDescription,
};
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

/// Lightweight HTTP client for Milvus / Zilliz Cloud operations.
pub struct MilvusClient {
    pub(crate) client: Client,
    pub(crate) base_url: String,
    pub(crate) token: String,
}

impl MilvusClient {
    /// Construct a client for the given endpoint and access token.
    pub fn new(uri: &str, token: &str) -> Result<Self, MilvusError> {
        let client = Client::builder().user_agent("pdf-ingest/0.1").build()?;
        let base_url = normalize_base_url(uri).map_err(MilvusError::InvalidUrl)?;
        tracing::debug!(
            url = %base_url,
            has_token = !token.is_empty(),
            "Initialized Milvus HTTP client"
        );

        Ok(Self {
            client,
            base_url,
            token: token.to_string(),
        })
    }

    /// Construct a client from resolved connection parameters.
    pub fn from_params(params: &ConnectionParams) -> Result<Self, MilvusError> {
        Self::new(&params.uri, &params.token)
    }

    /// Create a collection with the given schema and indexes.
    ///
    /// Fails with the store's error when the collection already exists.
    pub async fn create_collection(
        &self,
        collection_name: &str,
        schema: &CollectionSchema,
        index_params: &[IndexParams],
    ) -> Result<(), MilvusError> {
        let body = json!({
            "collectionName": collection_name,
            "schema": schema,
            "indexParams": index_params,
        });
        self.post::<Value>("collections/create", &body).await?;
        tracing::debug!(collection = collection_name, "Collection created");
        Ok(())
    }

    /// Drop a collection; a missing collection is reported as an error.
    ///
    /// Recent Milvus releases acknowledge a drop of an unknown name with code 0, so existence
    /// is checked first.
    pub async fn drop_collection(&self, collection_name: &str) -> Result<(), MilvusError> {
        if !self.has_collection(collection_name).await? {
            return Err(MilvusError::CollectionNotFound(collection_name.to_string()));
        }
        let body = json!({ "collectionName": collection_name });
        self.post::<Value>("collections/drop", &body).await?;
        tracing::debug!(collection = collection_name, "Collection dropped");
        Ok(())
    }

    /// Read back the schema, indexes, and load state of a collection.
    pub async fn describe_collection(
        &self,
        collection_name: &str,
    ) -> Result<CollectionDescription, MilvusError> {
        let body = json!({ "collectionName": collection_name });
        let raw: RawCollectionDescription = self
            .post("collections/describe", &body)
            .await?
            .ok_or_else(|| MilvusError::MalformedResponse("describe returned no data".into()))?;
        Ok(raw.into())
    }

    /// Retrieve the names of all collections.
    pub async fn list_collections(&self) -> Result<Vec<String>, MilvusError> {
        let names: Option<Vec<String>> = self.post("collections/list", &json!({})).await?;
        Ok(names.unwrap_or_default())
    }

    /// Whether a collection with the given name exists.
    pub async fn has_collection(&self, collection_name: &str) -> Result<bool, MilvusError> {
        let body = json!({ "collectionName": collection_name });
        let data: HasCollectionData = self
            .post("collections/has", &body)
            .await?
            .ok_or_else(|| MilvusError::MalformedResponse("has returned no data".into()))?;
        Ok(data.has)
    }

    /// Report whether a collection is currently queryable.
    pub async fn get_load_state(&self, collection_name: &str) -> Result<LoadState, MilvusError> {
        let body = json!({ "collectionName": collection_name });
        let data: LoadStateData = self
            .post("collections/get_load_state", &body)
            .await?
            .ok_or_else(|| {
                MilvusError::MalformedResponse("get_load_state returned no data".into())
            })?;
        Ok(data.load_state)
    }

    /// Insert rows in a single request.
    ///
    /// The store either accepts the whole batch or fails it; there is no per-row recovery.
    pub async fn insert<R>(
        &self,
        collection_name: &str,
        rows: &[R],
    ) -> Result<InsertSummary, MilvusError>
    where
        R: Serialize + Sync,
    {
        let body = json!({
            "collectionName": collection_name,
            "data": rows,
        });
        let data: Option<InsertData> = self.post("entities/insert", &body).await?;
        let insert_count = data.map(|data| data.insert_count).unwrap_or_default();
        tracing::debug!(
            collection = collection_name,
            rows = rows.len(),
            insert_count,
            "Rows inserted"
        );
        Ok(InsertSummary { insert_count })
    }

    async fn post<T>(&self, path: &str, body: &Value) -> Result<Option<T>, MilvusError>
    where
        T: DeserializeOwned,
    {
        let url = format_endpoint(&self.base_url, path);
        let response = self
            .client
            .post(url)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header(CONTENT_TYPE, "application/json")
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = MilvusError::UnexpectedStatus { status, body };
            tracing::error!(path, error = %error, "Milvus request failed");
            return Err(error);
        }

        let envelope: ApiResponse<T> = response.json().await?;
        if envelope.code != 0 {
            let error = MilvusError::Api {
                code: envelope.code,
                message: envelope.message.unwrap_or_default(),
            };
            tracing::error!(path, error = %error, "Milvus rejected request");
            return Err(error);
        }

        Ok(envelope.data)
    }
}

fn normalize_base_url(url: &str) -> Result<String, String> {
    let mut parsed = reqwest::Url::parse(url.trim()).map_err(|err| err.to_string())?;
    let path = parsed.path().trim_end_matches('/').to_string();
    parsed.set_path(&path);
    Ok(parsed.to_string())
}

fn format_endpoint(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/v2/vectordb/{path}")
}
