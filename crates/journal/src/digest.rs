use odoscan_core::Money;

use crate::summary::{account_totals, capture, entries, or_not_found, parse_amount, re_bank, re_company, re_date, re_payee, re_total};

/// Quick plain-text digest of journal OCR text: header fields, bank, total
/// and the amount posted to each account code.
pub fn digest(text: &str) -> String {
    let bank = re_bank()
        .captures(text)
        .map(|c| format!("{} #{}", c[1].trim(), &c[2]));
    let total = capture(re_total(), text).map(|t| parse_amount(&t)).unwrap_or_default();

    let mut out = String::new();
    out.push_str(&format!("Company: {}\n", or_not_found(&capture(re_company(), text))));
    out.push_str(&format!("Payee: {}\n", or_not_found(&capture(re_payee(), text))));
    out.push_str(&format!("Date: {}\n", or_not_found(&capture(re_date(), text))));
    out.push_str(&format!("Bank: {}\n", or_not_found(&bank)));
    out.push_str(&format!("Total: {} THB\n\n", Money::from_decimal(total)));

    out.push_str("Totals by account:\n");
    for (code, amount) in account_totals(&entries(text)) {
        out.push_str(&format!("- {code}: {} THB\n", Money::from_decimal(amount)));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_lists_bank_and_account_totals() {
        let text = "\
Pay to Siam Tools
Bank KBANK Silom #7788
| 1 | 215400 | a | b | 1,200.50 |
| 2 | 215400 | a | b | 800.00 |
| 3 | 211100 | a | b | 2,000.50 |
TOTALS 2,000.50";
        let out = digest(text);
        assert!(out.contains("Payee: Siam Tools\n"));
        assert!(out.contains("Bank: KBANK Silom #7788\n"));
        assert!(out.contains("Total: 2,000.50 THB\n"));
        assert!(out.contains("- 211100: 2,000.50 THB\n- 215400: 2,000.50 THB\n"));
        assert!(out.contains("Company: not found\n"));
    }

    #[test]
    fn digest_of_unrelated_text() {
        let out = digest("hello");
        assert!(out.contains("Bank: not found"));
        assert!(out.contains("Total: 0.00 THB"));
        assert!(out.ends_with("Totals by account:\n"));
    }
}
