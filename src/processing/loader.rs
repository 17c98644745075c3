//! Page-level text extraction.

use super::types::LoaderError;
use async_trait::async_trait;
use std::path::Path;

/// Source of page texts for a document on local disk.
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    /// Return the text of each page, in page order.
    async fn load_pages(&self, path: &Path) -> Result<Vec<String>, LoaderError>;
}

/// PDF loader backed by `pdf-extract`.
///
/// Extraction is CPU bound and synchronous, so it runs on the blocking pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfLoader;

#[async_trait]
impl DocumentLoader for PdfLoader {
    async fn load_pages(&self, path: &Path) -> Result<Vec<String>, LoaderError> {
        let bytes = tokio::fs::read(path).await?;
        let pages = tokio::task::spawn_blocking(move || extract_pages(&bytes))
            .await
            .map_err(|err| LoaderError::Worker(err.to_string()))??;
        tracing::debug!(path = %path.display(), pages = pages.len(), "Extracted PDF text");
        Ok(pages)
    }
}

/// Extract page texts from an in-memory PDF.
pub fn extract_pages(bytes: &[u8]) -> Result<Vec<String>, LoaderError> {
    let text =
        pdf_extract::extract_text_from_mem(bytes).map_err(|err| LoaderError::Pdf(err.to_string()))?;
    Ok(split_pages(&text))
}

/// Split extractor output into pages.
///
/// `pdf-extract` separates pages with form feeds; output without them is one page. Blank
/// pages are dropped.
pub(crate) fn split_pages(text: &str) -> Vec<String> {
    text.split('\x0C')
        .map(str::trim)
        .filter(|page| !page.is_empty())
        .map(str::to_string)
        .collect()
}
