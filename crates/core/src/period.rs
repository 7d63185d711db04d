use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use super::date::parse_calendar_date;
use super::statement::{Statement, StatementId};

pub const UNKNOWN_STATEMENT_LABEL: &str = "Unknown Statement";

/// Label and bounds inferred from one upload's transaction dates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementPeriod {
    pub label: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl StatementPeriod {
    pub fn into_statement(self, id: StatementId) -> Statement {
        Statement {
            id,
            label: self.label,
            start: self.start,
            end: self.end,
        }
    }
}

/// Infer the statement period from raw date strings, using the current time
/// as the fallback bound when nothing parses.
pub fn infer_period<S: AsRef<str>>(dates: &[S]) -> StatementPeriod {
    infer_period_at(dates, Utc::now())
}

pub fn infer_period_at<S: AsRef<str>>(dates: &[S], now: DateTime<Utc>) -> StatementPeriod {
    let mut parsed: Vec<NaiveDate> = dates
        .iter()
        .filter_map(|d| parse_calendar_date(d.as_ref()))
        .collect();
    parsed.sort();

    let (Some(&first), Some(&last)) = (parsed.first(), parsed.last()) else {
        return StatementPeriod {
            label: UNKNOWN_STATEMENT_LABEL.to_string(),
            start: now,
            end: now,
        };
    };

    let label = format!(
        "{} ({} \u{2013} {})",
        first.format("%B %Y"),
        first.format("%b %-d, %Y"),
        last.format("%b %-d, %Y"),
    );

    StatementPeriod {
        label,
        start: midnight_utc(first),
        end: midnight_utc(last),
    }
}

fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}
