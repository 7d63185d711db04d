use serde::{Deserialize, Serialize};

use super::category::Category;

/// A learned merchant → category association.
///
/// `merchant` is always stored trimmed and lower-cased; it is the rule's key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub merchant: String,
    pub category: Category,
}

impl CategoryRule {
    pub fn new(merchant: &str, category: Category) -> Self {
        CategoryRule {
            merchant: normalize_key(merchant),
            category,
        }
    }
}

pub fn normalize_key(merchant: &str) -> String {
    merchant.trim().to_lowercase()
}
