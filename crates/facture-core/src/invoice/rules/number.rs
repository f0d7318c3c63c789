//! Invoice number extraction.
//!
//! Priority order: a token after an explicit invoice label, then a token
//! after a bare `#`, then a standalone `INV-`/`FV-` style identifier.

use super::patterns::{INVOICE_NUMBER_HASH, INVOICE_NUMBER_LABELED, INVOICE_NUMBER_STANDALONE};
use super::{ExtractionMatch, FieldExtractor};

/// Invoice number field extractor.
pub struct InvoiceNumberExtractor;

impl InvoiceNumberExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for InvoiceNumberExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for InvoiceNumberExtractor {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        for pattern in [
            &*INVOICE_NUMBER_LABELED,
            &*INVOICE_NUMBER_HASH,
            &*INVOICE_NUMBER_STANDALONE,
        ] {
            if let Some(caps) = pattern.captures(text) {
                let raw = caps.get(1).unwrap();
                let value = trim_punctuation(raw.as_str());
                if !value.is_empty() {
                    return Some(
                        ExtractionMatch::new(value, raw.as_str())
                            .with_position(raw.start(), raw.end()),
                    );
                }
            }
        }
        None
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        INVOICE_NUMBER_LABELED
            .captures_iter(text)
            .filter_map(|caps| {
                let raw = caps.get(1)?;
                let value = trim_punctuation(raw.as_str());
                (!value.is_empty()).then(|| {
                    ExtractionMatch::new(value, raw.as_str())
                        .with_position(raw.start(), raw.end())
                })
            })
            .collect()
    }
}

fn trim_punctuation(s: &str) -> String {
    s.trim_matches(|c: char| c.is_whitespace() || (c.is_ascii_punctuation() && c != '-' && c != '/' && c != '_'))
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str) -> Option<String> {
        InvoiceNumberExtractor::new().extract(text).map(|m| m.value)
    }

    #[test]
    fn test_labeled_number() {
        assert_eq!(extract("Invoice #INV-001"), Some("INV-001".to_string()));
        assert_eq!(extract("Invoice no. 12345"), Some("12345".to_string()));
        assert_eq!(extract("Facture no 2024-117"), Some("2024-117".to_string()));
        assert_eq!(extract("INVOICE NUMBER: A-77/2"), Some("A-77/2".to_string()));
    }

    #[test]
    fn test_bare_hash() {
        assert_eq!(extract("ref # 778-A total 9.00"), Some("778-A".to_string()));
    }

    #[test]
    fn test_standalone_prefix() {
        assert_eq!(extract("see INV-2024-003 attached"), Some("INV-2024-003".to_string()));
    }

    #[test]
    fn test_label_wins_over_hash() {
        let text = "# 999 ... Invoice no. 111";
        assert_eq!(extract(text), Some("111".to_string()));
    }

    #[test]
    fn test_no_number() {
        assert_eq!(extract("just text, date 2024"), None);
        assert_eq!(extract(""), None);
    }
}
