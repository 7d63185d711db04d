use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::category::Category;
use super::money::Money;
use super::statement::StatementId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(pub Uuid);

impl TransactionId {
    pub fn new() -> Self {
        TransactionId(Uuid::new_v4())
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One statement line. `date` keeps the text exactly as it was parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub date: String,
    pub merchant: String,
    pub amount: Money,
    pub category: Option<Category>,
    pub statement_id: StatementId,
}

impl Transaction {
    /// Fresh, uncategorized transaction with a newly generated id.
    pub fn new(
        date: impl Into<String>,
        merchant: impl Into<String>,
        amount: Money,
        statement_id: StatementId,
    ) -> Self {
        Transaction {
            id: TransactionId::new(),
            date: date.into(),
            merchant: merchant.into(),
            amount,
            category: None,
            statement_id,
        }
    }

    pub fn is_categorized(&self) -> bool {
        self.category.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_transactions_are_uncategorized_with_unique_ids() {
        let sid = StatementId::new();
        let a = Transaction::new("2024-01-05", "Coffee Shop", Money::from_cents(-450), sid);
        let b = Transaction::new("2024-01-05", "Coffee Shop", Money::from_cents(-450), sid);
        assert!(!a.is_categorized());
        assert_ne!(a.id, b.id);
        assert_eq!(a.statement_id, sid);
    }

    #[test]
    fn serde_roundtrip_keeps_raw_date() {
        let mut tx = Transaction::new("01/05/24", "Gas", Money::from_cents(-4000), StatementId::new());
        tx.category = Some(Category::Auto);
        let json = serde_json::to_string(&tx).unwrap();
        let back: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tx);
        assert!(json.contains("\"category\":\"auto\""));
    }
}
