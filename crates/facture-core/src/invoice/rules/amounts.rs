//! Currency amount extraction.
//!
//! Priority order: a token within a fixed proximity window after a total
//! label ("total", "amount due", ...) wins; absent any labeled token, the
//! largest detected currency amount is used.

use std::str::FromStr;

use rust_decimal::Decimal;

use super::patterns::{AMOUNT, TOTAL_LABEL};
use super::{ExtractionMatch, FieldExtractor};

/// How far after a total label an amount token may sit, in bytes.
const LABEL_WINDOW: usize = 48;

/// Amount field extractor.
pub struct AmountExtractor;

impl AmountExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AmountExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for AmountExtractor {
    type Output = ExtractionMatch<Decimal>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        extract_total(text)
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        AMOUNT
            .find_iter(text)
            .filter_map(|m| {
                let amount = parse_amount(m.as_str())?;
                Some(ExtractionMatch::new(amount, m.as_str()).with_position(m.start(), m.end()))
            })
            .collect()
    }
}

/// Extract the document total.
pub fn extract_total(text: &str) -> Option<ExtractionMatch<Decimal>> {
    // Labeled token first.
    for label in TOTAL_LABEL.find_iter(text) {
        let window = clamp_to_char_boundary(text, label.end() + LABEL_WINDOW);
        let tail = &text[label.end()..window];
        if let Some(m) = AMOUNT.find(tail) {
            if let Some(amount) = parse_amount(m.as_str()) {
                let start = label.end() + m.start();
                return Some(
                    ExtractionMatch::new(amount, m.as_str())
                        .with_position(start, start + m.len()),
                );
            }
        }
    }

    // Fall back to the largest detected amount.
    AmountExtractor::new()
        .extract_all(text)
        .into_iter()
        .max_by(|a, b| a.value.cmp(&b.value))
}

/// Normalize a currency token to a decimal value.
///
/// With both separators present, the one closer to the end of the token is
/// the decimal separator and the other groups thousands; a lone separator
/// is decimal when exactly two digits follow it.
pub fn parse_amount(s: &str) -> Option<Decimal> {
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let comma = cleaned.rfind(',');
    let dot = cleaned.rfind('.');

    let normalized = match (comma, dot) {
        (Some(c), Some(d)) if c > d => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (Some(c), None) => {
            if cleaned.matches(',').count() == 1 && cleaned.len() - c == 3 {
                cleaned.replace(',', ".")
            } else {
                cleaned.replace(',', "")
            }
        }
        (None, Some(d)) => {
            if cleaned.matches('.').count() == 1 && cleaned.len() - d == 3 {
                cleaned
            } else {
                cleaned.replace('.', "")
            }
        }
        (None, None) => cleaned,
    };

    Decimal::from_str(&normalized).ok()
}

fn clamp_to_char_boundary(text: &str, mut index: usize) -> usize {
    index = index.min(text.len());
    while index > 0 && !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}
