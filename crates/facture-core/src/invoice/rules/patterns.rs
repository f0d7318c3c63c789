//! Common regex patterns for invoice field extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Date patterns
    pub static ref DATE_YMD: Regex = Regex::new(
        r"\b(\d{4})[./\-](\d{1,2})[./\-](\d{1,2})\b"
    ).unwrap();

    pub static ref DATE_DMY: Regex = Regex::new(
        r"\b(\d{1,2})[./\-](\d{1,2})[./\-](\d{4}|\d{2})\b"
    ).unwrap();

    // "Jan 15, 2024" / "January 15 2024" / "janvier 15, 2024"
    pub static ref DATE_MONTH_DAY_YEAR: Regex = Regex::new(
        r"(?i)\b([A-Za-zÀ-ÿ]{3,10})\.?\s+(\d{1,2})(?:st|nd|rd|th)?,?\s+(\d{4})\b"
    ).unwrap();

    // "15 January 2024" / "15 janvier 2024"
    pub static ref DATE_DAY_MONTH_YEAR: Regex = Regex::new(
        r"\b(\d{1,2})\s+([A-Za-zÀ-ÿ]{3,10})\.?,?\s+(\d{4})\b"
    ).unwrap();

    // Currency amounts: grouped integer part with either separator, two
    // decimal digits after the other separator.
    pub static ref AMOUNT: Regex = Regex::new(
        r"(?:\d{1,3}(?:[\s\u{00a0},.]\d{3})*|\d+)[.,]\d{2}\b"
    ).unwrap();

    // Labels a total amount sits after.
    pub static ref TOTAL_LABEL: Regex = Regex::new(
        r"(?i)\b(?:grand\s+total|amount\s+due|balance\s+due|total|montant\s+d[ûu]|montant|solde)\b"
    ).unwrap();

    // Invoice number patterns
    pub static ref INVOICE_NUMBER_LABELED: Regex = Regex::new(
        r"(?i)(?:invoice|facture)\s*(?:number|num[ée]ro|no\.?|nº|#)?\s*[:#]?\s*([A-Za-z][A-Za-z0-9/_\-]*\d[A-Za-z0-9/_\-]*|\d[A-Za-z0-9/_\-]*)"
    ).unwrap();

    pub static ref INVOICE_NUMBER_HASH: Regex = Regex::new(
        r"#\s*([A-Za-z0-9][A-Za-z0-9/_\-]*)"
    ).unwrap();

    pub static ref INVOICE_NUMBER_STANDALONE: Regex = Regex::new(
        r"(?i)\b((?:INV|FV|FAC)[\-/]?\d[\dA-Za-z/\-]*)\b"
    ).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_pattern_shapes() {
        for sample in ["1,234.56", "1.234,56", "1234.56", "123,45", "12 345,00"] {
            assert!(AMOUNT.is_match(sample), "no match for {}", sample);
        }
        assert!(!AMOUNT.is_match("no numbers here"));
    }

    #[test]
    fn test_total_label_word_boundary() {
        assert!(TOTAL_LABEL.is_match("Total: $5"));
        assert!(TOTAL_LABEL.is_match("Amount due"));
        // "Subtotal" must not read as a total label.
        assert!(!TOTAL_LABEL.is_match("Subtotal"));
    }

    #[test]
    fn test_invoice_label_requires_a_digit() {
        let caps = INVOICE_NUMBER_LABELED.captures("Invoice #INV-001").unwrap();
        assert_eq!(&caps[1], "INV-001");
        assert!(INVOICE_NUMBER_LABELED.captures("Invoice Date:").is_none());
    }
}
