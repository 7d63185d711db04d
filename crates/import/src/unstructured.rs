//! Best-effort transaction extraction from free-flowing document text.
//!
//! This is a fuzzy matcher, not a parser: a date token followed closely by a
//! money token is taken as one transaction and the surrounding text becomes
//! the merchant. False positives and misses are expected.

use std::str::FromStr;
use rust_decimal::Decimal;
use tally_core::{Money, StatementId, Transaction};
use tracing::debug;

/// Characters of context taken on each side of a match start.
const CONTEXT_CHARS: usize = 60;
const MAX_MERCHANT_CHARS: usize = 60;
pub const UNKNOWN_MERCHANT: &str = "Unknown";

re!(
    re_date_then_amount,
    concat!(
        r"(?P<date>\d{4}-\d{1,2}-\d{1,2}|\d{1,2}[/.-]\d{1,2}[/.-](?:\d{4}|\d{2}))",
        r"(?s:.){0,80}?",
        r"(?P<amount>-?(?:\$\s?)?-?(?:\d{1,3}(?:,\d{3})+|\d+)\.\d{2})\b",
    )
);

/// Scan page text (pages joined by `\n`) for date/amount pairs, in document order.
///
/// An empty result is a valid outcome here; callers decide how to report it.
pub fn extract_unstructured(text: &str, statement_id: StatementId) -> Vec<Transaction> {
    let mut transactions = Vec::new();

    for caps in re_date_then_amount().captures_iter(text) {
        let (Some(whole), Some(date), Some(amount)) =
            (caps.get(0), caps.name("date"), caps.name("amount"))
        else {
            continue;
        };

        let context = window(text, whole.start(), CONTEXT_CHARS, CONTEXT_CHARS);
        let merchant = merchant_from_context(context, date.as_str(), amount.as_str());
        let amount = parse_amount_token(amount.as_str());

        debug!(date = date.as_str(), %merchant, %amount, "matched document transaction");
        transactions.push(Transaction::new(date.as_str(), merchant, amount, statement_id));
    }

    transactions
}

fn merchant_from_context(context: &str, date: &str, amount: &str) -> String {
    let stripped = context.replacen(date, "", 1).replacen(amount, "", 1);
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    let truncated: String = collapsed.chars().take(MAX_MERCHANT_CHARS).collect();
    let merchant = truncated.trim();
    if merchant.is_empty() {
        UNKNOWN_MERCHANT.to_string()
    } else {
        merchant.to_string()
    }
}

/// Slice of `text` spanning `before` chars ahead of byte offset `at` and
/// `after` chars from it, clamped to the text.
fn window(text: &str, at: usize, before: usize, after: usize) -> &str {
    let start = text[..at]
        .char_indices()
        .rev()
        .take(before)
        .last()
        .map_or(at, |(i, _)| i);
    let end = text[at..]
        .char_indices()
        .nth(after)
        .map_or(text.len(), |(i, _)| at + i);
    &text[start..end]
}

fn parse_amount_token(token: &str) -> Money {
    let negative = token.contains('-');
    let digits: String = token
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    match Decimal::from_str(&digits) {
        Ok(dec) => Money::from_decimal(if negative { -dec } else { dec }),
        Err(_) => Money::zero(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str) -> Vec<Transaction> {
        extract_unstructured(text, StatementId::new())
    }

    // ── matching ──────────────────────────────────────────────────────────────

    #[test]
    fn finds_line_per_transaction() {
        let text = "ACME BANK STATEMENT\n\
                    01/05/2024 COFFEE SHOP DOWNTOWN $4.50\n\
                    01/06/2024 SHELL OIL 12345 -$40.00\n";
        let txs = extract(text);
        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0].date, "01/05/2024");
        assert_eq!(txs[0].amount.to_cents(), 450);
        assert_eq!(txs[1].date, "01/06/2024");
        assert_eq!(txs[1].amount.to_cents(), -4000);
        assert!(txs.iter().all(|t| t.category.is_none()));
    }

    #[test]
    fn iso_and_short_year_dates() {
        let txs = extract("2024-02-01 Rent 1,250.00\n2.3.24 Parking 7.00");
        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0].date, "2024-02-01");
        assert_eq!(txs[0].amount.to_cents(), 125_000);
        assert_eq!(txs[1].date, "2.3.24");
        assert_eq!(txs[1].amount.to_cents(), 700);
    }

    #[test]
    fn thousands_separators_and_negative_sign() {
        let txs = extract("03/01/24 Wire transfer -12,345.67");
        assert_eq!(txs[0].amount.to_cents(), -1_234_567);
    }

    #[test]
    fn amount_too_far_from_date_is_ignored() {
        let filler = "x".repeat(120);
        let txs = extract(&format!("01/05/2024 {filler} 4.50"));
        assert!(txs.is_empty());
    }

    #[test]
    fn amounts_need_two_decimals() {
        assert!(extract("01/05/2024 Coffee 4").is_empty());
        assert!(extract("01/05/2024 Coffee 4.5 only").is_empty());
    }

    #[test]
    fn no_matches_is_empty() {
        assert!(extract("Thank you for banking with us.").is_empty());
        assert!(extract("").is_empty());
    }

    // ── merchant context ─────────────────────────────────────────────────────

    #[test]
    fn merchant_is_context_without_tokens() {
        let txs = extract("01/05/2024 COFFEE SHOP 4.50");
        assert_eq!(txs[0].merchant, "COFFEE SHOP");
    }

    #[test]
    fn merchant_falls_back_to_unknown() {
        let txs = extract("01/05/2024 4.50");
        assert_eq!(txs[0].merchant, UNKNOWN_MERCHANT);
    }

    #[test]
    fn merchant_is_truncated_to_sixty_chars() {
        let long = "M".repeat(100);
        let txs = extract(&format!("01/05/2024 {long} 4.50"));
        assert_eq!(txs.len(), 0, "amount is beyond the 80 char gap");

        let txs = extract(&format!("{long} 01/05/2024 ABC 4.50"));
        assert_eq!(txs.len(), 1);
        assert!(txs[0].merchant.chars().count() <= MAX_MERCHANT_CHARS);
    }

    #[test]
    fn window_respects_char_boundaries() {
        let text = "Café Crème ünïcödé 01/05/2024 Bäckerei 3.20";
        let txs = extract(text);
        assert_eq!(txs.len(), 1);
        assert!(txs[0].merchant.contains("Bäckerei"));
    }

    #[test]
    fn window_clamps_at_text_edges() {
        assert_eq!(window("abcdef", 0, 60, 60), "abcdef");
        assert_eq!(window("abcdef", 3, 2, 2), "bcde");
        assert_eq!(window("abcdef", 6, 1, 5), "f");
    }

    // ── amount token ──────────────────────────────────────────────────────────

    #[test]
    fn parse_amount_token_variants() {
        assert_eq!(parse_amount_token("$1,234.56").to_cents(), 123_456);
        assert_eq!(parse_amount_token("-$ 4.50").to_cents(), -450);
        assert_eq!(parse_amount_token("$-4.50").to_cents(), -450);
        assert_eq!(parse_amount_token("0.99").to_cents(), 99);
    }
}
