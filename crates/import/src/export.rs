use tally_core::Transaction;
use thiserror::Error;

pub const EXPORT_HEADER: [&str; 4] = ["Date", "Merchant", "Amount", "Category"];

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Export is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Render transactions as `Date,Merchant,Amount,Category` CSV.
///
/// Fields holding a comma, quote or newline are quoted with inner quotes
/// doubled. Amounts always carry two decimals; a missing category is empty.
pub fn export_csv(transactions: &[Transaction]) -> Result<String, ExportError> {
    let mut out = Vec::new();
    write_row(&mut out, &EXPORT_HEADER)?;
    for tx in transactions {
        let amount = tx.amount.to_string();
        let category = tx.category.map(|c| c.as_str()).unwrap_or_default();
        write_row(&mut out, &[tx.date.as_str(), tx.merchant.as_str(), amount.as_str(), category])?;
    }
    Ok(String::from_utf8(out)?)
}

// The tabular parser also splits on `;` and tab, so rows holding either are
// written fully quoted.
fn write_row(out: &mut Vec<u8>, fields: &[&str]) -> Result<(), ExportError> {
    let style = if fields.iter().any(|f| f.contains([';', '\t'])) {
        csv::QuoteStyle::Always
    } else {
        csv::QuoteStyle::Necessary
    };
    let mut writer = csv::WriterBuilder::new()
        .quote_style(style)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(out);
    writer.write_record(fields)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tabular::parse_tabular;
    use tally_core::{Category, Money, StatementId};

    fn tx(date: &str, merchant: &str, cents: i64, category: Option<Category>) -> Transaction {
        let mut t = Transaction::new(date, merchant, Money::from_cents(cents), StatementId::new());
        t.category = category;
        t
    }

    #[test]
    fn header_and_plain_rows() {
        let out = export_csv(&[
            tx("2024-01-05", "Coffee Shop", -450, Some(Category::Meal)),
            tx("2024-01-06", "Gas Station", -4000, None),
        ])
        .unwrap();
        assert_eq!(
            out,
            "Date,Merchant,Amount,Category\n\
             2024-01-05,Coffee Shop,-4.50,meal\n\
             2024-01-06,Gas Station,-40.00,\n"
        );
    }

    #[test]
    fn quotes_only_when_needed() {
        let out = export_csv(&[tx("2024-01-05", "Joe's \"Best\" Diner, Inc", 1200, None)]).unwrap();
        let line = out.lines().nth(1).unwrap();
        assert_eq!(line, r#"2024-01-05,"Joe's ""Best"" Diner, Inc",12.00,"#);
    }

    #[test]
    fn whole_amounts_get_two_decimals() {
        let out = export_csv(&[tx("2024-01-05", "Refund", 2500, None)]).unwrap();
        assert!(out.contains(",25.00,"));
    }

    #[test]
    fn empty_export_is_just_the_header() {
        assert_eq!(export_csv(&[]).unwrap(), "Date,Merchant,Amount,Category\n");
    }

    #[test]
    fn export_then_parse_round_trips() {
        let original = vec![
            tx("2024-01-05", "Coffee Shop", -450, Some(Category::Meal)),
            tx("01/06/24", "Diner, Inc", -1299, None),
            tx("2024-01-07", "The \"Quoted\" Store", 100_000, Some(Category::Purchases)),
            tx("2024-01-08", "Zero", 0, None),
        ];
        let text = export_csv(&original).unwrap();
        let parsed = parse_tabular(&text, StatementId::new());
        assert_eq!(parsed.len(), original.len());
        for (a, b) in original.iter().zip(&parsed) {
            assert_eq!(a.date, b.date);
            assert_eq!(a.merchant, b.merchant);
            assert_eq!(a.amount, b.amount);
        }
    }

    #[test]
    fn semicolons_and_tabs_are_quoted() {
        let out = export_csv(&[tx("2024-01-05", "AMAZON; MKTP", -450, None)]).unwrap();
        assert_eq!(out.lines().nth(1).unwrap(), r#""2024-01-05","AMAZON; MKTP","-4.50","""#);

        let original = vec![
            tx("2024-01-05", "AMAZON; MKTP", -450, Some(Category::Purchases)),
            tx("2024-01-06", "TAB\tSTORE", -100, None),
            tx("2024-01-07", "Plain", 200, None),
        ];
        let parsed = parse_tabular(&export_csv(&original).unwrap(), StatementId::new());
        assert_eq!(parsed.len(), 3);
        for (a, b) in original.iter().zip(&parsed) {
            assert_eq!(a.date, b.date);
            assert_eq!(a.merchant, b.merchant);
            assert_eq!(a.amount, b.amount);
        }
    }

    #[test]
    fn document_merchants_survive_export_and_reimport() {
        let id = StatementId::new();
        let extracted = crate::unstructured::extract_unstructured("01/05/2024 AMAZON; MKTP 4.50", id);
        assert_eq!(extracted.len(), 1);
        assert_eq!(extracted[0].merchant, "AMAZON; MKTP");

        let parsed = parse_tabular(&export_csv(&extracted).unwrap(), id);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].merchant, "AMAZON; MKTP");
        assert_eq!(parsed[0].amount.to_cents(), 450);
        assert_eq!(parsed[0].date, "01/05/2024");
    }
}
