use std::path::Path;
use std::sync::Arc;

use tally_core::{StatementId, Transaction};
use tally_import::extract_unstructured;
use tracing::debug;

use crate::backend::{ExtractionError, TextBackend};

/// Orchestrates: read bytes → page text (off the async runtime) → extract.
#[derive(Clone)]
pub struct DocumentPipeline {
    backend: Arc<dyn TextBackend>,
}

impl DocumentPipeline {
    pub fn new(backend: impl TextBackend + 'static) -> Self {
        Self { backend: Arc::new(backend) }
    }

    pub fn with_backend(backend: Arc<dyn TextBackend>) -> Self {
        Self { backend }
    }

    /// Page texts joined with `\n`, in page order.
    pub async fn read_text(&self, data: Vec<u8>) -> Result<String, ExtractionError> {
        let backend = Arc::clone(&self.backend);
        let pages = tokio::task::spawn_blocking(move || backend.page_texts(&data))
            .await
            .map_err(|e| ExtractionError::Join(e.to_string()))??;
        debug!(pages = pages.len(), "read document text");
        Ok(pages.join("\n"))
    }

    /// Process raw document bytes into uncategorized transactions.
    pub async fn process_bytes(
        &self,
        data: Vec<u8>,
        statement_id: StatementId,
    ) -> Result<Vec<Transaction>, ExtractionError> {
        let text = self.read_text(data).await?;
        Ok(extract_unstructured(&text, statement_id))
    }

    /// Process a document on disk.
    pub async fn process_file(
        &self,
        path: &Path,
        statement_id: StatementId,
    ) -> Result<Vec<Transaction>, ExtractionError> {
        let bytes = tokio::fs::read(path).await?;
        self.process_bytes(bytes, statement_id).await
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MockTextBackend, UnavailableBackend};

    #[tokio::test]
    async fn pages_are_joined_in_order() {
        let pipeline = DocumentPipeline::new(MockTextBackend::new(["first", "second", "third"]));
        assert_eq!(pipeline.read_text(vec![]).await.unwrap(), "first\nsecond\nthird");
    }

    #[tokio::test]
    async fn process_bytes_extracts_across_pages() {
        let sid = StatementId::new();
        let pipeline = DocumentPipeline::new(MockTextBackend::new([
            "ACME BANK\n01/05/2024 COFFEE SHOP $4.50",
            "01/06/2024 SHELL OIL -$40.00",
        ]));

        let txs = pipeline.process_bytes(b"%PDF".to_vec(), sid).await.unwrap();

        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0].amount.to_cents(), 450);
        assert_eq!(txs[1].amount.to_cents(), -4000);
        assert!(txs.iter().all(|t| t.statement_id == sid && t.category.is_none()));
    }

    #[tokio::test]
    async fn text_without_transactions_is_empty_not_error() {
        let pipeline = DocumentPipeline::new(MockTextBackend::new(["Thank you for banking with us"]));
        let txs = pipeline.process_bytes(vec![1, 2, 3], StatementId::new()).await.unwrap();
        assert!(txs.is_empty());
    }

    #[tokio::test]
    async fn backend_failure_propagates() {
        let pipeline = DocumentPipeline::new(MockTextBackend::failing("encrypted"));
        let err = pipeline.process_bytes(vec![], StatementId::new()).await.unwrap_err();
        assert!(matches!(err, ExtractionError::Unreadable(_)));

        let pipeline = DocumentPipeline::new(UnavailableBackend);
        let err = pipeline.process_bytes(vec![], StatementId::new()).await.unwrap_err();
        assert!(matches!(err, ExtractionError::NotAvailable));
    }

    #[tokio::test]
    async fn process_file_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("statement.pdf");
        tokio::fs::write(&path, b"%PDF-1.4").await.unwrap();

        let pipeline = DocumentPipeline::new(MockTextBackend::new(["2024-02-01 Rent 1,250.00"]));
        let txs = pipeline.process_file(&path, StatementId::new()).await.unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].amount.to_cents(), 125_000);
    }

    #[tokio::test]
    async fn process_file_missing_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = DocumentPipeline::new(MockTextBackend::new(Vec::<String>::new()));
        let err = pipeline
            .process_file(&dir.path().join("nope.pdf"), StatementId::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::Io(_)));
    }
}
