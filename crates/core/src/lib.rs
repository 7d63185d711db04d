macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static regex::Regex {
            static R: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
            R.get_or_init(|| regex::Regex::new($pat).expect("invalid regex"))
        }
    };
}

pub mod aggregate;
pub mod category;
pub mod date;
pub mod money;
pub mod period;
pub mod rule;
pub mod statement;
pub mod transaction;

pub use aggregate::{
    bucket_total, grand_total, normalize_date, totals_by_category, totals_by_date_and_category,
    CategoryTotals, DailyCategoryTotals,
};
pub use category::{Category, CategoryBucket};
pub use date::parse_calendar_date;
pub use money::Money;
pub use period::{infer_period, infer_period_at, StatementPeriod, UNKNOWN_STATEMENT_LABEL};
pub use rule::CategoryRule;
pub use statement::{Statement, StatementId};
pub use transaction::{Transaction, TransactionId};
