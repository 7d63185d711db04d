use std::str::FromStr;

use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_core::{Money, StatementId, Transaction};
use tracing::debug;

re!(re_date_header, r"(?i)date");
re!(re_merchant_header, r"(?i)desc|merchant|payee|name");
re!(re_amount_header, r"(?i)amount|amt|usd");
re!(re_number_prefix, r"^(-?)(\d*)(?:\.(\d*))?");

/// Column positions guessed from a header row. `None` means not found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub date_column: Option<usize>,
    pub merchant_column: Option<usize>,
    pub amount_column: Option<usize>,
}

impl ColumnMapping {
    /// First matching header wins for each field.
    pub fn detect<S: AsRef<str>>(headers: &[S]) -> Self {
        let find = |re: &Regex| headers.iter().position(|h| re.is_match(h.as_ref()));
        ColumnMapping {
            date_column: find(re_date_header()),
            merchant_column: find(re_merchant_header()),
            amount_column: find(re_amount_header()),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.date_column.is_some() && self.merchant_column.is_some() && self.amount_column.is_some()
    }

    fn field<'a>(cells: &'a [String], column: Option<usize>) -> &'a str {
        column
            .and_then(|idx| cells.get(idx))
            .map(String::as_str)
            .unwrap_or_default()
    }
}

/// Parse delimited statement text into uncategorized transactions.
///
/// The first non-empty line is the header. Cells split on `,`, `;` or tab;
/// double-quoted cells may contain delimiters. Rows missing a date or a
/// merchant are dropped; unreadable amounts become zero.
pub fn parse_tabular(text: &str, statement_id: StatementId) -> Vec<Transaction> {
    let mut lines = text.split('\n').filter(|l| !l.trim().is_empty());
    let Some(header) = lines.next() else {
        return Vec::new();
    };

    let mapping = ColumnMapping::detect(&split_cells(header));
    if !mapping.is_complete() {
        debug!(?mapping, "header is missing expected columns");
    }

    let mut transactions = Vec::new();
    for (idx, line) in lines.enumerate() {
        let cells = split_cells(line);
        let date = ColumnMapping::field(&cells, mapping.date_column).trim();
        let merchant = ColumnMapping::field(&cells, mapping.merchant_column).trim();
        if date.is_empty() || merchant.is_empty() {
            debug!(row = idx + 2, "dropping row without date or merchant");
            continue;
        }
        let amount = parse_amount(ColumnMapping::field(&cells, mapping.amount_column));
        transactions.push(Transaction::new(date, merchant, amount, statement_id));
    }

    transactions
}

fn split_cells(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    cell.push('"');
                } else {
                    in_quotes = false;
                }
            }
            // A quote only opens a quoted cell at the start of the cell.
            '"' if cell.trim().is_empty() => {
                cell.clear();
                in_quotes = true;
            }
            ',' | ';' | '\t' if !in_quotes => cells.push(std::mem::take(&mut cell)),
            _ => cell.push(c),
        }
    }
    cells.push(cell);
    cells
}

/// Keeps digits, `.` and `-`, then reads the longest numeric prefix.
/// Anything unreadable is zero so the row survives for manual correction.
fn parse_amount(field: &str) -> Money {
    let cleaned: String = field
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();

    let parsed = re_number_prefix().captures(&cleaned).and_then(|c| {
        let sign = c.get(1).map_or("", |m| m.as_str());
        let int = c.get(2).map_or("", |m| m.as_str());
        let frac = c.get(3).map_or("", |m| m.as_str());
        if int.is_empty() && frac.is_empty() {
            return None;
        }
        let int = if int.is_empty() { "0" } else { int };
        let frac = if frac.is_empty() { "0" } else { frac };
        Decimal::from_str(&format!("{sign}{int}.{frac}")).ok()
    });

    match parsed {
        Some(dec) => Money::from_decimal(dec),
        None => {
            if !field.trim().is_empty() {
                debug!(field, "non-numeric amount, using zero");
            }
            Money::zero()
        }
    }
}
