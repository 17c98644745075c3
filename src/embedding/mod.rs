use crate::config::{Config, EmbeddingProvider};
use async_trait::async_trait;
use thiserror::Error;

mod ollama;
mod openai;

pub use ollama::OllamaClient;
pub use openai::OpenAiClient;

/// Errors raised by embedding providers.
#[derive(Debug, Error)]
pub enum EmbeddingClientError {
    /// Client could not be constructed from configuration.
    #[error("Embedding provider misconfigured: {0}")]
    Configuration(String),
    /// HTTP layer failed before receiving a response.
    #[error("Embedding request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Provider was unable to produce embeddings for the supplied input.
    #[error("Failed to generate embeddings: {0}")]
    GenerationFailed(String),
}

/// Interface implemented by embedding backends.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Produce an embedding vector for each supplied chunk of text, in input order.
    async fn generate_embeddings(
        &self,
        texts: Vec<String>,
    ) -> Result<Vec<Vec<f32>>, EmbeddingClientError>;
}

/// Build the embedding client selected by configuration.
pub fn get_embedding_client(
    config: &Config,
) -> Result<Box<dyn EmbeddingClient>, EmbeddingClientError> {
    tracing::debug!(
        provider = ?config.embedding_provider,
        model = %config.embedding_model,
        "Building embedding client"
    );
    match config.embedding_provider {
        EmbeddingProvider::OpenAI => {
            let api_key = config.openai_api_key.as_deref().ok_or_else(|| {
                EmbeddingClientError::Configuration("OPENAI_API_KEY is not set".into())
            })?;
            Ok(Box::new(OpenAiClient::new(
                api_key,
                config.openai_base_url.as_deref(),
                &config.embedding_model,
            )?))
        }
        EmbeddingProvider::Ollama => Ok(Box::new(OllamaClient::new(
            config.ollama_url.as_deref(),
            &config.embedding_model,
        )?)),
    }
}

/// Validate that a provider returned exactly one vector per input.
pub(crate) fn ensure_count(
    vectors: Vec<Vec<f32>>,
    expected: usize,
) -> Result<Vec<Vec<f32>>, EmbeddingClientError> {
    if vectors.len() == expected {
        Ok(vectors)
    } else {
        Err(EmbeddingClientError::GenerationFailed(format!(
            "provider returned {} embeddings for {} inputs",
            vectors.len(),
            expected
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openai_requires_api_key() {
        let config = Config::from_source(|_| None).expect("config");
        let error = get_embedding_client(&config).err().expect("missing key");
        assert!(matches!(error, EmbeddingClientError::Configuration(_)));
    }

    #[test]
    fn ollama_needs_no_credentials() {
        let config = Config::from_source(|key| match key {
            "EMBEDDING_PROVIDER" => Some("ollama".into()),
            _ => None,
        })
        .expect("config");
        assert!(get_embedding_client(&config).is_ok());
    }

    #[test]
    fn count_mismatch_is_an_error() {
        assert!(ensure_count(vec![vec![0.0]], 1).is_ok());
        assert!(ensure_count(vec![vec![0.0]], 2).is_err());
    }
}
