//! Extraction result model handed back to GUI/CLI collaborators.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::business::MatchResult;
use crate::ocr::PageText;

/// Keys of the per-field confidence map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Document OCR text confidence.
    OcrText,
    Company,
    Total,
    Date,
    InvoiceNumber,
}

/// Structured record produced by one parse call.
///
/// Missing fields are `None`, never errors; `is_valid` requires the overall
/// confidence to reach the configured threshold and both company and total
/// to be present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Canonical company name resolved from the registry, if any.
    pub company: Option<String>,

    /// Invoice total.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<Decimal>,

    /// Invoice date (ISO 8601 when serialized).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,

    /// Invoice number, trimmed of surrounding whitespace/punctuation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_number: Option<String>,

    /// Raw aggregated document text.
    pub raw_text: String,

    /// Overall confidence in [0, 1].
    pub confidence: f32,

    /// Per-field confidence scores.
    pub field_confidence: HashMap<FieldKind, f32>,

    /// Whether the result meets the validity contract.
    pub is_valid: bool,

    /// Per-page OCR results, for diagnostics and interactive correction.
    pub pages: Vec<PageText>,

    /// Details of the company match, when one was accepted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_match: Option<MatchResult>,
}

impl ExtractionResult {
    /// An all-null result carrying only the (possibly empty) document text.
    pub fn empty(raw_text: String, pages: Vec<PageText>) -> Self {
        Self {
            company: None,
            total: None,
            date: None,
            invoice_number: None,
            raw_text,
            confidence: 0.0,
            field_confidence: HashMap::new(),
            is_valid: false,
            pages,
            company_match: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_result_is_invalid() {
        let result = ExtractionResult::empty(String::new(), Vec::new());
        assert!(!result.is_valid);
        assert_eq!(result.confidence, 0.0);
        assert!(result.company.is_none());
    }

    #[test]
    fn test_date_serializes_iso() {
        let mut result = ExtractionResult::empty("x".to_string(), Vec::new());
        result.date = NaiveDate::from_ymd_opt(2024, 1, 15);
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"2024-01-15\""));
    }
}
