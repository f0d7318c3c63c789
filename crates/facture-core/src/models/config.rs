//! Configuration structures for the extraction pipeline.
//!
//! The core receives an immutable snapshot of these values; loading from
//! YAML or the environment is a collaborator concern.

use serde::{Deserialize, Serialize};

/// Main configuration for the facture pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FactureConfig {
    /// OCR configuration.
    pub ocr: OcrConfig,

    /// Business/keyword matching configuration.
    pub matching: MatchingConfig,

    /// Confidence scoring weights.
    pub scoring: ScoringConfig,
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Recognition language passed to the backend (e.g. "eng", "fra").
    pub language: String,

    /// Per-page confidence threshold (0.0 - 1.0); below it, the page is
    /// retried with more aggressive preprocessing. Also the overall
    /// validity threshold for the final result.
    pub confidence_threshold: f32,

    /// Maximum recognition attempts per page.
    pub max_retries: u32,

    /// Optional hard bound on a single page recognition, in milliseconds.
    /// A timed-out attempt counts against the retry budget.
    pub page_timeout_ms: Option<u64>,

    /// Minimum embedded-text length for a PDF text layer to be trusted
    /// instead of running OCR.
    pub min_embedded_text_len: usize,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            confidence_threshold: 0.6,
            max_retries: 3,
            page_timeout_ms: None,
            min_embedded_text_len: 50,
        }
    }
}

/// Business/keyword matching configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Minimum similarity for accepting a fuzzy keyword match (0.0 - 1.0).
    pub fuzzy_threshold: f32,

    /// Default case sensitivity for newly added keywords.
    pub case_sensitive_default: bool,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: 0.8,
            case_sensitive_default: false,
        }
    }
}

/// Weights combining document OCR confidence and per-field presence into
/// the overall extraction confidence. Expected to sum to 1.0.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Weight of the document OCR confidence.
    pub ocr_text: f32,

    /// Weight of the company match score.
    pub company: f32,

    /// Weight of a successfully extracted total.
    pub total: f32,

    /// Weight of a successfully extracted date.
    pub date: f32,

    /// Weight of a successfully extracted invoice number.
    pub invoice_number: f32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            ocr_text: 0.4,
            company: 0.2,
            total: 0.2,
            date: 0.1,
            invoice_number: 0.1,
        }
    }
}

impl FactureConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FactureConfig::default();
        assert_eq!(config.ocr.language, "eng");
        assert_eq!(config.ocr.confidence_threshold, 0.6);
        assert_eq!(config.ocr.max_retries, 3);
        assert_eq!(config.matching.fuzzy_threshold, 0.8);
        assert!(!config.matching.case_sensitive_default);
    }

    #[test]
    fn test_scoring_weights_sum_to_one() {
        let s = ScoringConfig::default();
        let sum = s.ocr_text + s.company + s.total + s.date + s.invoice_number;
        assert!((sum - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: FactureConfig =
            serde_json::from_str(r#"{"ocr": {"language": "fra"}}"#).unwrap();
        assert_eq!(config.ocr.language, "fra");
        assert_eq!(config.ocr.max_retries, 3);
        assert_eq!(config.matching.fuzzy_threshold, 0.8);
    }
}
