//! Per-category and per-day totals consumed by analytics views.
//!
//! Everything here is recomputed from the transaction slice on each call;
//! nothing is cached between requests.

use std::collections::BTreeMap;

use serde::Serialize;

use super::category::{Category, CategoryBucket};
use super::date::{expand_year, parse_calendar_date};
use super::money::Money;
use super::transaction::Transaction;

pub type CategoryTotals = BTreeMap<CategoryBucket, Money>;

/// Signed sum per bucket. Buckets without transactions are absent and read as zero.
pub fn totals_by_category(transactions: &[Transaction]) -> CategoryTotals {
    let mut totals = CategoryTotals::new();
    for tx in transactions {
        *totals.entry(CategoryBucket::from(tx.category)).or_default() += tx.amount;
    }
    totals
}

pub fn bucket_total(totals: &CategoryTotals, bucket: CategoryBucket) -> Money {
    totals.get(&bucket).copied().unwrap_or_default()
}

pub fn grand_total(totals: &CategoryTotals) -> Money {
    totals.values().copied().sum()
}

/// One row of the date × category matrix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyCategoryTotals {
    pub date: String,
    #[serde(flatten)]
    pub totals: BTreeMap<Category, Money>,
}

impl DailyCategoryTotals {
    fn zeroed(date: String) -> Self {
        DailyCategoryTotals {
            date,
            totals: Category::ALL.into_iter().map(|c| (c, Money::zero())).collect(),
        }
    }

    pub fn get(&self, category: Category) -> Money {
        self.totals.get(&category).copied().unwrap_or_default()
    }
}

/// Rows keyed by normalized date, ascending, with every fixed category present.
/// Uncategorized amounts create the row for their date but add to no column.
pub fn totals_by_date_and_category(transactions: &[Transaction]) -> Vec<DailyCategoryTotals> {
    let mut rows: BTreeMap<String, DailyCategoryTotals> = BTreeMap::new();
    for tx in transactions {
        let key = normalize_date(&tx.date);
        let row = rows
            .entry(key.clone())
            .or_insert_with(|| DailyCategoryTotals::zeroed(key));
        if let Some(category) = tx.category {
            *row.totals.entry(category).or_default() += tx.amount;
        }
    }
    rows.into_values().collect()
}

re!(re_loose_numeric, r"\b(\d{1,2})[/.-](\d{1,2})[/.-](\d{2,4})\b");

/// Bucket key for a raw date: `YYYY-MM-DD` when it can be recovered, the raw
/// text otherwise.
pub fn normalize_date(raw: &str) -> String {
    if let Some(date) = parse_calendar_date(raw) {
        return date.format("%Y-%m-%d").to_string();
    }

    if let Some(c) = re_loose_numeric().captures(raw) {
        let a: u32 = c[1].parse().unwrap_or_default();
        let b: u32 = c[2].parse().unwrap_or_default();
        let year = expand_year(c[3].parse().unwrap_or_default());
        // Month-first unless the first part cannot be a month.
        let (month, day) = if a > 12 { (b, a) } else { (a, b) };
        return format!("{year:04}-{month:02}-{day:02}");
    }

    raw.to_string()
}
