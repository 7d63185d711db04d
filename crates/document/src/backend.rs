use std::sync::Arc;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Document text could not be read: {0}")]
    Unreadable(String),
    #[error("PDF support not available, build with `pdf` feature")]
    NotAvailable,
    #[error("Text extraction task failed: {0}")]
    Join(String),
}

/// Abstraction over a document text backend.
/// Implementations accept raw document bytes and return the text of each page
/// in page order.
pub trait TextBackend: Send + Sync {
    fn page_texts(&self, data: &[u8]) -> Result<Vec<String>, ExtractionError>;
}

/// The backend this build can offer: real PDF text when the `pdf` feature is
/// on, otherwise one that reports PDF support as unavailable.
pub fn default_backend() -> Arc<dyn TextBackend> {
    #[cfg(feature = "pdf")]
    let backend: Arc<dyn TextBackend> = Arc::new(pdf_backend::PdfTextBackend);
    #[cfg(not(feature = "pdf"))]
    let backend: Arc<dyn TextBackend> = Arc::new(UnavailableBackend);
    backend
}

// ── Mock backend (always available, used for tests) ───────────────────────────

/// Returns preset pages, or a preset failure, regardless of input bytes.
pub struct MockTextBackend {
    pages: Result<Vec<String>, String>,
}

impl MockTextBackend {
    pub fn new<S: Into<String>>(pages: impl IntoIterator<Item = S>) -> Self {
        Self {
            pages: Ok(pages.into_iter().map(Into::into).collect()),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self { pages: Err(message.into()) }
    }
}

impl TextBackend for MockTextBackend {
    fn page_texts(&self, _data: &[u8]) -> Result<Vec<String>, ExtractionError> {
        self.pages.clone().map_err(ExtractionError::Unreadable)
    }
}

/// Stand-in used when the crate is built without a PDF backend.
pub struct UnavailableBackend;

impl TextBackend for UnavailableBackend {
    fn page_texts(&self, _data: &[u8]) -> Result<Vec<String>, ExtractionError> {
        Err(ExtractionError::NotAvailable)
    }
}

// ── pdf-extract backend (optional, gated behind `pdf` feature) ────────────────

#[cfg(feature = "pdf")]
pub mod pdf_backend {
    use super::{ExtractionError, TextBackend};

    pub struct PdfTextBackend;

    impl TextBackend for PdfTextBackend {
        fn page_texts(&self, data: &[u8]) -> Result<Vec<String>, ExtractionError> {
            pdf_extract::extract_text_from_mem_by_pages(data)
                .map_err(|e| ExtractionError::Unreadable(e.to_string()))
        }
    }
}
