//! The upload session: ingest statements, categorize, undo, export.
//!
//! All state lives in [`SessionState`]. Every mutation builds its new records
//! first, writes them through the [`StateStore`], and only then swaps them into
//! memory, so a failed write leaves the in-memory state untouched. Records are
//! written one at a time; a failure part way can leave earlier ones stored.

use std::path::Path;

use tally_core::{
    infer_period, Category, CategoryRule, CategoryTotals, DailyCategoryTotals, Statement,
    StatementId, Transaction, TransactionId,
};
use tally_document::DocumentPipeline;
use tally_import::{export_csv, parse_tabular, CategoryRuleEngine, ExportError, ImportError, SourceKind};
use tally_storage::{StateStore, StorageError, UiState};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Transaction not found: {0}")]
    TransactionNotFound(TransactionId),
    #[error("Statement not found: {0}")]
    StatementNotFound(StatementId),
    #[error("Export failed: {0}")]
    Export(#[from] ExportError),
}

/// A file handed over by the presentation layer.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { name, bytes })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Imported { statement_id: StatementId, count: usize },
    /// Nothing from this file was merged.
    Skipped(ImportError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub name: String,
    pub outcome: FileOutcome,
}

/// Per-file outcomes of one `ingest` call, in upload order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub files: Vec<FileReport>,
}

impl IngestReport {
    pub fn imported(&self) -> impl Iterator<Item = (StatementId, usize)> + '_ {
        self.files.iter().filter_map(|f| match f.outcome {
            FileOutcome::Imported { statement_id, count } => Some((statement_id, count)),
            FileOutcome::Skipped(_) => None,
        })
    }

    pub fn skipped(&self) -> impl Iterator<Item = (&str, &ImportError)> + '_ {
        self.files.iter().filter_map(|f| match &f.outcome {
            FileOutcome::Skipped(e) => Some((f.name.as_str(), e)),
            FileOutcome::Imported { .. } => None,
        })
    }

    pub fn transaction_count(&self) -> usize {
        self.imported().map(|(_, count)| count).sum()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    /// Newest upload first.
    pub transactions: Vec<Transaction>,
    /// Newest upload first.
    pub statements: Vec<Statement>,
    pub rules: CategoryRuleEngine,
    pub ui: UiState,
}

pub struct Session<S: StateStore> {
    state: SessionState,
    /// Full transaction snapshots, most recent last.
    history: Vec<Vec<Transaction>>,
    store: S,
    documents: DocumentPipeline,
}

impl<S: StateStore> Session<S> {
    /// Restore a session from `store`. Missing records start empty.
    pub async fn load(store: S, documents: DocumentPipeline) -> Result<Self, SessionError> {
        let state = SessionState {
            transactions: store.load_transactions().await?,
            statements: store.load_statements().await?,
            rules: CategoryRuleEngine::new(store.load_rules().await?),
            ui: store.load_ui_state().await?,
        };
        info!(
            transactions = state.transactions.len(),
            statements = state.statements.len(),
            rules = state.rules.len(),
            "session loaded"
        );
        Ok(Self {
            state,
            history: Vec::new(),
            store,
            documents,
        })
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.state.transactions
    }

    pub fn statements(&self) -> &[Statement] {
        &self.state.statements
    }

    pub fn rules(&self) -> &[CategoryRule] {
        self.state.rules.rules()
    }

    pub fn ui(&self) -> &UiState {
        &self.state.ui
    }

    pub fn selected_statement(&self) -> Option<StatementId> {
        self.state.ui.selected_statement_id
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Install `seed` as the rule table if no rules exist yet.
    pub async fn seed_rules(&mut self, seed: CategoryRuleEngine) -> Result<bool, SessionError> {
        if !self.state.rules.is_empty() || seed.is_empty() {
            return Ok(false);
        }
        info!(rules = seed.len(), "seeding rule table");
        self.store.save_rules(seed.rules()).await?;
        self.state.rules = seed;
        Ok(true)
    }

    // ── ingest ────────────────────────────────────────────────────────────────

    /// Import each file as its own statement. Files are processed one at a
    /// time and a failing file never affects the others.
    pub async fn ingest(&mut self, files: Vec<UploadedFile>) -> Result<IngestReport, SessionError> {
        let mut report = IngestReport::default();
        let mut staged: Vec<(Statement, Vec<Transaction>)> = Vec::new();

        for file in files {
            let statement_id = StatementId::new();
            let name = file.name.clone();
            let outcome = match self.import_file(file, statement_id).await {
                Ok(batch) => {
                    let dates: Vec<&str> = batch.iter().map(|t| t.date.as_str()).collect();
                    let statement = infer_period(&dates).into_statement(statement_id);
                    let count = batch.len();
                    info!(file = %name, statement = %statement.label, count, "imported statement");
                    staged.push((statement, batch));
                    FileOutcome::Imported { statement_id, count }
                }
                Err(e) => {
                    warn!(file = %name, error = %e, "skipped file");
                    FileOutcome::Skipped(e)
                }
            };
            report.files.push(FileReport { name, outcome });
        }

        if staged.is_empty() {
            return Ok(report);
        }

        // The batch goes ahead of older uploads but keeps its own upload order.
        let first_new = staged.first().map(|(s, _)| s.id);
        let mut statements = Vec::with_capacity(staged.len() + self.state.statements.len());
        let mut transactions = Vec::new();
        for (statement, batch) in staged {
            statements.push(statement);
            transactions.extend(batch);
        }
        statements.extend(self.state.statements.iter().cloned());
        transactions.extend(self.state.transactions.iter().cloned());

        let mut ui = self.state.ui.clone();
        if ui.selected_statement_id.is_none() {
            ui.selected_statement_id = first_new;
        }

        self.store.save_transactions(&transactions).await?;
        self.store.save_statements(&statements).await?;
        self.store.save_ui_state(&ui).await?;

        self.state.statements = statements;
        self.state.transactions = transactions;
        self.state.ui = ui;
        Ok(report)
    }

    async fn import_file(
        &self,
        file: UploadedFile,
        statement_id: StatementId,
    ) -> Result<Vec<Transaction>, ImportError> {
        let raw = match SourceKind::from_file_name(&file.name)? {
            SourceKind::Tabular => parse_tabular(&String::from_utf8_lossy(&file.bytes), statement_id),
            SourceKind::Document => self
                .documents
                .process_bytes(file.bytes, statement_id)
                .await
                .map_err(|e| ImportError::Extraction(e.to_string()))?,
        };
        if raw.is_empty() {
            return Err(ImportError::EmptyBatch);
        }
        Ok(self.state.rules.apply(&raw))
    }

    // ── categorization ────────────────────────────────────────────────────────

    /// Set (or clear) one transaction's category. With `learn`, the
    /// transaction's merchant also becomes a rule for `category`.
    pub async fn assign_category(
        &mut self,
        id: TransactionId,
        category: Option<Category>,
        learn: bool,
    ) -> Result<(), SessionError> {
        let idx = self
            .state
            .transactions
            .iter()
            .position(|t| t.id == id)
            .ok_or(SessionError::TransactionNotFound(id))?;

        let mut transactions = self.state.transactions.clone();
        let merchant = transactions[idx].merchant.clone();
        transactions[idx].category = category;

        let learned = match (learn, category) {
            (true, Some(category)) => {
                let mut rules = self.state.rules.clone();
                rules.learn(&merchant, category);
                Some(rules)
            }
            _ => None,
        };

        self.store.save_transactions(&transactions).await?;
        if let Some(rules) = &learned {
            self.store.save_rules(rules.rules()).await?;
        }
        debug!(transaction = %id, ?category, "category assigned");

        self.history.push(std::mem::replace(&mut self.state.transactions, transactions));
        if let Some(rules) = learned {
            self.state.rules = rules;
        }
        Ok(())
    }

    /// Restore the transaction list as it was before the last assignment.
    /// Learned rules stay. Returns `false` when there is nothing to undo.
    ///
    /// The snapshot replaces the whole list, so transactions imported after
    /// that assignment are dropped while their statements remain.
    pub async fn undo(&mut self) -> Result<bool, SessionError> {
        let Some(snapshot) = self.history.last() else {
            return Ok(false);
        };
        self.store.save_transactions(snapshot).await?;
        if let Some(snapshot) = self.history.pop() {
            self.state.transactions = snapshot;
        }
        Ok(true)
    }

    pub async fn delete_rule(&mut self, index: usize) -> Result<Option<CategoryRule>, SessionError> {
        let mut rules = self.state.rules.clone();
        let Some(removed) = rules.delete(index) else {
            return Ok(None);
        };
        self.store.save_rules(rules.rules()).await?;
        info!(merchant = %removed.merchant, "rule deleted");
        self.state.rules = rules;
        Ok(Some(removed))
    }

    // ── statements ────────────────────────────────────────────────────────────

    /// Drop a statement with all its transactions, including from undo
    /// history. Returns `false` for an unknown id.
    pub async fn remove_statement(&mut self, id: StatementId) -> Result<bool, SessionError> {
        let Some(pos) = self.state.statements.iter().position(|s| s.id == id) else {
            return Ok(false);
        };
        let mut statements = self.state.statements.clone();
        let removed = statements.remove(pos);
        let transactions: Vec<Transaction> = self
            .state
            .transactions
            .iter()
            .filter(|t| t.statement_id != id)
            .cloned()
            .collect();
        let mut ui = self.state.ui.clone();
        if ui.selected_statement_id == Some(id) {
            ui.selected_statement_id = statements.first().map(|s| s.id);
        }

        self.store.save_transactions(&transactions).await?;
        self.store.save_statements(&statements).await?;
        self.store.save_ui_state(&ui).await?;
        info!(statement = %removed.label, "statement removed");

        for snapshot in &mut self.history {
            snapshot.retain(|t| t.statement_id != id);
        }
        self.state.statements = statements;
        self.state.transactions = transactions;
        self.state.ui = ui;
        Ok(true)
    }

    pub async fn select_statement(&mut self, id: StatementId) -> Result<(), SessionError> {
        self.statement(id)?;
        let ui = UiState {
            selected_statement_id: Some(id),
            ..self.state.ui.clone()
        };
        self.store.save_ui_state(&ui).await?;
        self.state.ui = ui;
        Ok(())
    }

    pub async fn set_active_tab(&mut self, tab: impl Into<String>) -> Result<(), SessionError> {
        let ui = UiState {
            active_tab: tab.into(),
            ..self.state.ui.clone()
        };
        self.store.save_ui_state(&ui).await?;
        self.state.ui = ui;
        Ok(())
    }

    pub fn statement(&self, id: StatementId) -> Result<&Statement, SessionError> {
        self.state
            .statements
            .iter()
            .find(|s| s.id == id)
            .ok_or(SessionError::StatementNotFound(id))
    }

    /// The statement's transactions in collection order.
    pub fn statement_transactions(&self, id: StatementId) -> Vec<Transaction> {
        self.state
            .transactions
            .iter()
            .filter(|t| t.statement_id == id)
            .cloned()
            .collect()
    }

    // ── analytics / export ────────────────────────────────────────────────────

    pub fn totals_by_category(&self, id: StatementId) -> CategoryTotals {
        tally_core::totals_by_category(&self.statement_transactions(id))
    }

    pub fn totals_by_date_and_category(&self, id: StatementId) -> Vec<DailyCategoryTotals> {
        tally_core::totals_by_date_and_category(&self.statement_transactions(id))
    }

    pub fn export_categorized(&self, id: StatementId) -> Result<String, SessionError> {
        self.statement(id)?;
        Ok(export_csv(&self.statement_transactions(id))?)
    }
}
