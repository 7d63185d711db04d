use serde::{Deserialize, Serialize};
use tally_core::rule::normalize_key;
use tally_core::{Category, CategoryRule, Transaction};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum RuleFileError {
    #[error("Failed to parse rules TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Rule for '{merchant}': {message}")]
    InvalidCategory { merchant: String, message: String },
}

/// Learned merchant rules, kept in insertion order.
///
/// Order matters: when several keys are substrings of a merchant, the
/// earliest rule wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryRuleEngine {
    rules: Vec<CategoryRule>,
}

#[derive(Debug, Deserialize)]
struct RuleFile {
    #[serde(default)]
    rules: Vec<RuleFileEntry>,
}

#[derive(Debug, Deserialize)]
struct RuleFileEntry {
    merchant: String,
    category: String,
}

impl CategoryRuleEngine {
    /// Build from stored rules, collapsing duplicate keys (last one wins).
    pub fn new(rules: Vec<CategoryRule>) -> Self {
        let mut engine = Self::default();
        for rule in rules {
            engine.learn(&rule.merchant, rule.category);
        }
        engine
    }

    /// Load a seed file of the form
    ///
    /// ```toml
    /// [[rules]]
    /// merchant = "Coffee Shop"
    /// category = "meal"
    /// ```
    pub fn from_toml(toml_content: &str) -> Result<Self, RuleFileError> {
        let file: RuleFile = toml::from_str(toml_content)?;
        let mut engine = Self::default();
        for entry in file.rules {
            let category = entry
                .category
                .parse::<Category>()
                .map_err(|message| RuleFileError::InvalidCategory {
                    merchant: entry.merchant.clone(),
                    message,
                })?;
            engine.learn(&entry.merchant, category);
        }
        Ok(engine)
    }

    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }

    pub fn into_rules(self) -> Vec<CategoryRule> {
        self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Exact key match first, then the first key contained in the merchant.
    pub fn find_match(&self, merchant: &str) -> Option<&CategoryRule> {
        let text = merchant.to_lowercase();
        let key = text.trim();
        self.rules
            .iter()
            .find(|r| r.merchant == key)
            .or_else(|| self.rules.iter().find(|r| text.contains(&r.merchant)))
    }

    /// Fill in categories for uncategorized transactions.
    ///
    /// Categorized transactions are returned unchanged, so applying twice
    /// gives the same result as applying once.
    pub fn apply(&self, transactions: &[Transaction]) -> Vec<Transaction> {
        transactions
            .iter()
            .map(|tx| {
                let mut tx = tx.clone();
                if tx.category.is_none() {
                    if let Some(rule) = self.find_match(&tx.merchant) {
                        debug!(merchant = %tx.merchant, rule = %rule.merchant, category = %rule.category, "rule matched");
                        tx.category = Some(rule.category);
                    }
                }
                tx
            })
            .collect()
    }

    /// Upsert keyed by case-insensitive merchant. An existing rule keeps its
    /// position; a new one is appended. Blank merchants are ignored.
    pub fn learn(&mut self, merchant: &str, category: Category) {
        let key = normalize_key(merchant);
        if key.is_empty() {
            debug!("ignoring rule for blank merchant");
            return;
        }
        match self.rules.iter_mut().find(|r| r.merchant == key) {
            Some(rule) => rule.category = category,
            None => self.rules.push(CategoryRule { merchant: key, category }),
        }
    }

    /// Remove the rule at `index`. Transactions it already categorized keep
    /// their category.
    pub fn delete(&mut self, index: usize) -> Option<CategoryRule> {
        (index < self.rules.len()).then(|| self.rules.remove(index))
    }
}
