//! OCR pipeline: preprocessing, recognition backend, per-page retry and
//! document aggregation.

mod aggregate;
mod backend;
mod engine;
mod preprocess;
pub mod retry;

pub use aggregate::PageAggregator;
pub use backend::{Recognition, RecognitionBackend};
pub use engine::OcrEngine;
pub use preprocess::{ImagePreprocessor, MAX_LEVEL};

#[cfg(feature = "tesseract")]
pub use backend::TesseractBackend;

use serde::{Deserialize, Serialize};

/// Separator between page texts in the aggregated document text.
///
/// Form feed is stripped from each page's own text before joining, so the
/// separator is never page content.
pub const PAGE_SEPARATOR: char = '\u{0C}';

/// OCR output for a single page. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageText {
    /// 1-based page index.
    pub page: u32,
    /// Recognized text.
    pub text: String,
    /// Recognition confidence in [0, 1].
    pub confidence: f32,
}

/// Where the document text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextSource {
    /// Recognized by the OCR pipeline.
    Ocr,
    /// Read from the PDF's embedded text layer.
    Embedded,
}

/// Aggregated text and confidence for a whole document.
#[derive(Debug, Clone)]
pub struct DocumentText {
    /// Page texts joined with [`PAGE_SEPARATOR`], in page order.
    pub text: String,
    /// Length-weighted average of per-page confidences, in [0, 1].
    pub confidence: f32,
    /// Per-page results, ascending page index.
    pub pages: Vec<PageText>,
    pub source: TextSource,
}

impl DocumentText {
    /// Combine per-page results into a document-level text and confidence.
    ///
    /// Pages with more recognized characters weigh more; a zero-length page
    /// contributes zero weight rather than dragging the average down.
    pub fn from_pages(pages: Vec<PageText>) -> Self {
        let text = pages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join(&PAGE_SEPARATOR.to_string());

        let total_len: usize = pages.iter().map(|p| p.text.chars().count()).sum();
        let confidence = if total_len == 0 {
            0.0
        } else {
            pages
                .iter()
                .map(|p| p.text.chars().count() as f32 * p.confidence)
                .sum::<f32>()
                / total_len as f32
        };

        Self {
            text,
            confidence: confidence.clamp(0.0, 1.0),
            pages,
            source: TextSource::Ocr,
        }
    }

    /// Wrap a PDF's embedded text layer; trusted at full confidence.
    pub fn embedded(text: String) -> Self {
        Self {
            text,
            confidence: 1.0,
            pages: Vec::new(),
            source: TextSource::Embedded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn page(n: u32, text: &str, confidence: f32) -> PageText {
        PageText {
            page: n,
            text: text.to_string(),
            confidence,
        }
    }

    #[test]
    fn test_join_uses_page_separator() {
        let doc = DocumentText::from_pages(vec![page(1, "alpha", 0.9), page(2, "beta", 0.5)]);
        assert_eq!(doc.text, "alpha\u{0C}beta");
    }

    #[test]
    fn test_confidence_is_length_weighted() {
        // 8 chars at 1.0, 2 chars at 0.5 -> (8 + 1) / 10
        let doc = DocumentText::from_pages(vec![page(1, "aaaaaaaa", 1.0), page(2, "bb", 0.5)]);
        assert!((doc.confidence - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_blank_page_contributes_no_weight() {
        let doc = DocumentText::from_pages(vec![page(1, "text", 0.8), page(2, "", 0.0)]);
        assert!((doc.confidence - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_all_blank_pages_score_zero() {
        let doc = DocumentText::from_pages(vec![page(1, "", 0.0), page(2, "", 0.0)]);
        assert_eq!(doc.confidence, 0.0);
        assert_eq!(doc.text, "\u{0C}");
    }
}
