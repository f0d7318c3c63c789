//! Invoice field extraction: pattern rules, extraction strategies, and the
//! parse orchestrator.

mod parser;
pub mod rules;

pub use parser::{InvoiceParser, ParseOutcome, ParseStage};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use rules::{AmountExtractor, DateExtractor, ExtractionMatch, FieldExtractor, InvoiceNumberExtractor};

/// Document type being extracted; each kind dispatches to its own field
/// strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceExtractionKind {
    /// A supplier invoice with an invoice number.
    Invoice,
    /// A point-of-sale receipt; no invoice number is expected.
    Receipt,
}

impl InvoiceExtractionKind {
    pub(crate) fn strategy(&self) -> &'static dyn FieldStrategy {
        match self {
            InvoiceExtractionKind::Invoice => &InvoiceFields,
            InvoiceExtractionKind::Receipt => &ReceiptFields,
        }
    }
}

/// Fields a strategy pulled out of the document text.
#[derive(Debug, Clone, Default)]
pub(crate) struct ExtractedFields {
    pub total: Option<ExtractionMatch<Decimal>>,
    pub date: Option<ExtractionMatch<NaiveDate>>,
    pub invoice_number: Option<ExtractionMatch<String>>,
}

/// Kind-specific field extraction behind one capability seam.
pub(crate) trait FieldStrategy: Sync {
    fn extract(&self, text: &str) -> ExtractedFields;

    /// Whether this kind scores an invoice number at all.
    fn uses_invoice_number(&self) -> bool;
}

struct InvoiceFields;

impl FieldStrategy for InvoiceFields {
    fn extract(&self, text: &str) -> ExtractedFields {
        ExtractedFields {
            total: AmountExtractor::new().extract(text),
            date: DateExtractor::new().extract(text),
            invoice_number: InvoiceNumberExtractor::new().extract(text),
        }
    }

    fn uses_invoice_number(&self) -> bool {
        true
    }
}

struct ReceiptFields;

impl FieldStrategy for ReceiptFields {
    fn extract(&self, text: &str) -> ExtractedFields {
        ExtractedFields {
            total: AmountExtractor::new().extract(text),
            date: DateExtractor::new().extract(text),
            invoice_number: None,
        }
    }

    fn uses_invoice_number(&self) -> bool {
        false
    }
}

/// A pattern-extractable field, for the standalone correction workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternField {
    Date,
    Amount,
    InvoiceNumber,
}

/// Value produced by [`extract_field`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldValue {
    Date(NaiveDate),
    Amount(Decimal),
    InvoiceNumber(String),
}

/// Run one field extractor over arbitrary text, for interactive
/// re-extraction after a manual correction.
pub fn extract_field(field: PatternField, text: &str) -> Option<FieldValue> {
    match field {
        PatternField::Date => DateExtractor::new()
            .extract(text)
            .map(|m| FieldValue::Date(m.value)),
        PatternField::Amount => AmountExtractor::new()
            .extract(text)
            .map(|m| FieldValue::Amount(m.value)),
        PatternField::InvoiceNumber => InvoiceNumberExtractor::new()
            .extract(text)
            .map(|m| FieldValue::InvoiceNumber(m.value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_extract_field_dispatch() {
        assert_eq!(
            extract_field(PatternField::Date, "Date: 2024-01-15"),
            Some(FieldValue::Date(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()))
        );
        assert_eq!(
            extract_field(PatternField::Amount, "Total: $19.99"),
            Some(FieldValue::Amount(Decimal::from_str("19.99").unwrap()))
        );
        assert_eq!(
            extract_field(PatternField::InvoiceNumber, "Invoice #A-1"),
            Some(FieldValue::InvoiceNumber("A-1".to_string()))
        );
        assert_eq!(extract_field(PatternField::Date, "none"), None);
    }

    #[test]
    fn test_receipt_strategy_skips_invoice_number() {
        let text = "Total: 10.00 Invoice #X-9";
        let receipt = InvoiceExtractionKind::Receipt.strategy().extract(text);
        assert!(receipt.invoice_number.is_none());
        assert!(receipt.total.is_some());

        let invoice = InvoiceExtractionKind::Invoice.strategy().extract(text);
        assert_eq!(invoice.invoice_number.unwrap().value, "X-9");
    }
}
