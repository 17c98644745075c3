use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;
use thiserror::Error;

/// Default embedding dimension produced by OpenAI's ada-002 model.
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 1536;
/// Default maximum characters per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 512;
/// Default characters shared between adjacent chunks.
pub const DEFAULT_CHUNK_OVERLAP: usize = 100;

const DEFAULT_OPENAI_MODEL: &str = "text-embedding-ada-002";
const DEFAULT_OLLAMA_MODEL: &str = "nomic-embed-text";

/// Errors encountered while loading configuration or resolving connection parameters.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
    /// One or more vector store connection parameters were absent or empty.
    #[error("Missing required parameters: {}", .0.join(", "))]
    MissingConnectionParameters(Vec<&'static str>),
}

/// Runtime configuration for the ingestion pipeline.
#[derive(Debug, Clone)]
pub struct Config {
    /// Milvus / Zilliz Cloud endpoint.
    pub milvus_uri: Option<String>,
    /// Access token presented to Milvus.
    pub milvus_token: Option<String>,
    /// Default collection receiving inserted records.
    pub collection_name: Option<String>,
    /// Bucket the event handler accepts notifications for.
    pub pdf_bucket_name: Option<String>,
    /// Embedding provider used to generate vector representations.
    pub embedding_provider: EmbeddingProvider,
    /// Embedding model identifier passed to the provider.
    pub embedding_model: String,
    /// Dimensionality of the produced vectors.
    pub embedding_dimension: usize,
    /// Number of chunks sent per embedding request.
    pub embedding_batch_size: usize,
    /// API key for the OpenAI-compatible provider.
    pub openai_api_key: Option<String>,
    /// Base URL for the OpenAI-compatible provider.
    pub openai_base_url: Option<String>,
    /// Base URL of the Ollama runtime.
    pub ollama_url: Option<String>,
    /// Maximum characters per chunk.
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks.
    pub chunk_overlap: usize,
    /// Directory used for downloaded objects.
    pub scratch_dir: PathBuf,
    /// Optional override for the webhook server port.
    pub server_port: Option<u16>,
}

/// Supported embedding backends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmbeddingProvider {
    /// Local Ollama runtime.
    Ollama,
    /// Hosted OpenAI embeddings API (or any compatible endpoint).
    OpenAI,
}

impl Config {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// Blank values are treated as absent so that `KEY=` in a `.env` file does not shadow
    /// a default.
    pub fn from_source<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let embedding_provider = match get("EMBEDDING_PROVIDER") {
            Some(value) => value
                .parse()
                .map_err(|()| ConfigError::InvalidValue("EMBEDDING_PROVIDER".to_string()))?,
            None => EmbeddingProvider::OpenAI,
        };
        let embedding_model = get("EMBEDDING_MODEL").unwrap_or_else(|| {
            match embedding_provider {
                EmbeddingProvider::OpenAI => DEFAULT_OPENAI_MODEL,
                EmbeddingProvider::Ollama => DEFAULT_OLLAMA_MODEL,
            }
            .to_string()
        });

        let embedding_batch_size =
            parse_or(get("EMBEDDING_BATCH_SIZE"), "EMBEDDING_BATCH_SIZE", 1)?.max(1);

        Ok(Self {
            milvus_uri: get("ZILLIZ_CLOUD_URI"),
            milvus_token: get("ZILLIZ_TOKEN"),
            collection_name: get("COLLECTION_NAME"),
            pdf_bucket_name: get("PDF_BUCKET_NAME"),
            embedding_provider,
            embedding_model,
            embedding_dimension: parse_or(
                get("EMBEDDING_DIMENSION"),
                "EMBEDDING_DIMENSION",
                DEFAULT_EMBEDDING_DIMENSION,
            )?,
            embedding_batch_size,
            openai_api_key: get("OPENAI_API_KEY"),
            openai_base_url: get("OPENAI_BASE_URL"),
            ollama_url: get("OLLAMA_URL"),
            chunk_size: parse_or(
                get("TEXT_SPLITTER_CHUNK_SIZE"),
                "TEXT_SPLITTER_CHUNK_SIZE",
                DEFAULT_CHUNK_SIZE,
            )?,
            chunk_overlap: parse_or(
                get("TEXT_SPLITTER_CHUNK_OVERLAP"),
                "TEXT_SPLITTER_CHUNK_OVERLAP",
                DEFAULT_CHUNK_OVERLAP,
            )?,
            scratch_dir: get("SCRATCH_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(env::temp_dir),
            server_port: get("SERVER_PORT")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("SERVER_PORT".into()))
                })
                .transpose()?,
        })
    }

    /// Expected bucket for trigger events.
    pub fn require_bucket(&self) -> Result<&str, ConfigError> {
        self.pdf_bucket_name
            .as_deref()
            .ok_or_else(|| ConfigError::MissingVariable("PDF_BUCKET_NAME".to_string()))
    }
}

fn parse_or<T: std::str::FromStr>(
    value: Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

impl std::str::FromStr for EmbeddingProvider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" => Ok(Self::OpenAI),
            _ => Err(()),
        }
    }
}

/// Resolved vector store connection parameters.
///
/// Each field follows the same precedence: an explicit argument wins, otherwise the value
/// loaded from the environment is used. Resolution fails before any network activity when a
/// field is still missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    /// Target collection.
    pub collection_name: String,
    /// Milvus / Zilliz Cloud endpoint.
    pub uri: String,
    /// Access token.
    pub token: String,
}

impl ConnectionParams {
    /// Resolve parameters from explicit overrides falling back to `config`.
    pub fn resolve(
        collection_name: Option<String>,
        uri: Option<String>,
        token: Option<String>,
        config: &Config,
    ) -> Result<Self, ConfigError> {
        let pick = |explicit: Option<String>, fallback: &Option<String>| {
            explicit
                .filter(|value| !value.trim().is_empty())
                .or_else(|| fallback.clone())
        };

        let collection_name = pick(collection_name, &config.collection_name);
        let uri = pick(uri, &config.milvus_uri);
        let token = pick(token, &config.milvus_token);

        match (collection_name, uri, token) {
            (Some(collection_name), Some(uri), Some(token)) => Ok(Self {
                collection_name,
                uri,
                token,
            }),
            (collection_name, uri, token) => {
                let mut missing = Vec::new();
                if collection_name.is_none() {
                    missing.push("collection_name");
                }
                if uri.is_none() {
                    missing.push("uri");
                }
                if token.is_none() {
                    missing.push("token");
                }
                Err(ConfigError::MissingConnectionParameters(missing))
            }
        }
    }
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Load configuration from `.env` and the environment and install it in the global cache.
///
/// The first successful call wins; later calls return the cached value.
pub fn init_config() -> Result<&'static Config, ConfigError> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    tracing::debug!(
        milvus_uri = ?config.milvus_uri,
        collection = ?config.collection_name,
        bucket = ?config.pdf_bucket_name,
        embedding_provider = ?config.embedding_provider,
        embedding_model = %config.embedding_model,
        chunk_size = config.chunk_size,
        chunk_overlap = config.chunk_overlap,
        "Loaded configuration"
    );
    Ok(CONFIG.get_or_init(|| config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Config::from_source(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_match_pipeline_expectations() {
        let config = config_from(&[]).expect("config");
        assert_eq!(config.embedding_provider, EmbeddingProvider::OpenAI);
        assert_eq!(config.embedding_model, "text-embedding-ada-002");
        assert_eq!(config.embedding_dimension, 1536);
        assert_eq!(config.embedding_batch_size, 1);
        assert_eq!(config.chunk_size, 512);
        assert_eq!(config.chunk_overlap, 100);
        assert!(config.milvus_uri.is_none());
    }

    #[test]
    fn blank_values_are_treated_as_missing() {
        let config =
            config_from(&[("ZILLIZ_TOKEN", "  "), ("COLLECTION_NAME", "")]).expect("config");
        assert!(config.milvus_token.is_none());
        assert!(config.collection_name.is_none());
    }

    #[test]
    fn rejects_unparseable_numbers() {
        let error = config_from(&[("TEXT_SPLITTER_CHUNK_SIZE", "big")]).unwrap_err();
        assert!(matches!(
            error,
            ConfigError::InvalidValue(key) if key == "TEXT_SPLITTER_CHUNK_SIZE"
        ));
    }

    #[test]
    fn rejects_unknown_provider() {
        let error = config_from(&[("EMBEDDING_PROVIDER", "cohere")]).unwrap_err();
        assert!(matches!(error, ConfigError::InvalidValue(_)));
    }

    #[test]
    fn ollama_provider_picks_local_default_model() {
        let config = config_from(&[("EMBEDDING_PROVIDER", "Ollama")]).expect("config");
        assert_eq!(config.embedding_provider, EmbeddingProvider::Ollama);
        assert_eq!(config.embedding_model, "nomic-embed-text");
    }

    #[test]
    fn explicit_connection_params_override_environment() {
        let config = config_from(&[
            ("COLLECTION_NAME", "env-collection"),
            ("ZILLIZ_CLOUD_URI", "https://env.example"),
            ("ZILLIZ_TOKEN", "env-token"),
        ])
        .expect("config");

        let params =
            ConnectionParams::resolve(Some("docs".into()), None, Some("secret".into()), &config)
                .expect("params");
        assert_eq!(params.collection_name, "docs");
        assert_eq!(params.uri, "https://env.example");
        assert_eq!(params.token, "secret");
    }

    #[test]
    fn missing_connection_params_are_all_reported() {
        let config = config_from(&[("ZILLIZ_CLOUD_URI", "https://env.example")]).expect("config");
        let error =
            ConnectionParams::resolve(None, None, Some(String::new()), &config).unwrap_err();
        match error {
            ConfigError::MissingConnectionParameters(missing) => {
                assert_eq!(missing, vec!["collection_name", "token"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
