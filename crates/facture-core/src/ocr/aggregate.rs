//! Document-level OCR orchestration across pages.

use image::DynamicImage;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::cancel::CancelToken;
use crate::error::OcrError;
use crate::models::config::OcrConfig;

use super::backend::Recognition;
use super::engine::OcrEngine;
use super::preprocess::{ImagePreprocessor, MAX_LEVEL};
use super::{DocumentText, PAGE_SEPARATOR, PageText, retry};

/// Runs OCR across all pages of a document, preserving page order.
///
/// Pages are dispatched to the rayon worker pool; the aggregated text and
/// confidence are functions of the page index only, so concurrent
/// completion order never changes the result.
pub struct PageAggregator {
    engine: OcrEngine,
    preprocessor: ImagePreprocessor,
    config: OcrConfig,
}

impl PageAggregator {
    pub fn new(engine: OcrEngine, config: OcrConfig) -> Self {
        Self {
            engine,
            preprocessor: ImagePreprocessor::new(),
            config,
        }
    }

    pub fn with_preprocessor(mut self, preprocessor: ImagePreprocessor) -> Self {
        self.preprocessor = preprocessor;
        self
    }

    /// Recognize every page and combine the results.
    ///
    /// Returns [`OcrError::Cancelled`] when the token is observed set
    /// between page recognitions; infrastructure failures propagate as-is.
    pub fn extract(
        &self,
        images: &[DynamicImage],
        cancel: &CancelToken,
    ) -> Result<DocumentText, OcrError> {
        info!("Running OCR over {} pages", images.len());

        let mut pages = images
            .par_iter()
            .enumerate()
            .map(|(index, image)| {
                if cancel.is_cancelled() {
                    return Err(OcrError::Cancelled);
                }
                self.recognize_page(index as u32 + 1, image)
            })
            .collect::<Result<Vec<PageText>, OcrError>>()?;

        if cancel.is_cancelled() {
            return Err(OcrError::Cancelled);
        }

        // Aggregation is a function of the page index, not completion order.
        pages.sort_by_key(|p| p.page);

        let doc = DocumentText::from_pages(pages);
        info!(
            "Aggregated {} pages at confidence {:.2}",
            doc.pages.len(),
            doc.confidence
        );
        Ok(doc)
    }

    /// Recognize one page, retrying with progressively more aggressive
    /// preprocessing while the confidence stays below threshold.
    fn recognize_page(&self, page: u32, image: &DynamicImage) -> Result<PageText, OcrError> {
        let attempts = self.config.max_retries.max(1);
        let threshold = self.config.confidence_threshold;

        let best = retry::best_attempt(
            attempts,
            |attempt| {
                let level = attempt.min(MAX_LEVEL as u32) as u8;
                debug!("Page {} attempt {} at preprocess level {}", page, attempt + 1, level);
                let prepared = self.preprocessor.apply(image, level);
                self.engine.recognize_bounded(&prepared)
            },
            |recognition| recognition.confidence,
            |recognition| recognition.confidence >= threshold,
        )?;

        let recognition = best.unwrap_or(Recognition {
            text: String::new(),
            confidence: 0.0,
        });

        Ok(PageText {
            page,
            // The separator must never be page content.
            text: recognition.text.replace(PAGE_SEPARATOR, " "),
            confidence: recognition.confidence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::backend::RecognitionBackend;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    /// Maps page images to scripted texts by image width, with optional
    /// per-page delays to force out-of-order completion.
    struct PagedBackend {
        scripts: Vec<(u32, &'static str, f32, u64)>,
        calls: AtomicU32,
    }

    impl PagedBackend {
        fn new(scripts: Vec<(u32, &'static str, f32, u64)>) -> Self {
            Self {
                scripts,
                calls: AtomicU32::new(0),
            }
        }
    }

    impl RecognitionBackend for PagedBackend {
        fn recognize(
            &self,
            image: &DynamicImage,
            _language: &str,
        ) -> Result<Recognition, OcrError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let (_, text, confidence, delay_ms) = self
                .scripts
                .iter()
                .find(|(width, ..)| *width == image.width())
                .copied()
                .unwrap_or((0, "", 0.0, 0));
            if delay_ms > 0 {
                std::thread::sleep(Duration::from_millis(delay_ms));
            }
            Ok(Recognition {
                text: text.to_string(),
                confidence,
            })
        }
    }

    fn image_of_width(width: u32) -> DynamicImage {
        DynamicImage::new_luma8(width, 4)
    }

    fn aggregator(backend: Arc<dyn RecognitionBackend>, config: OcrConfig) -> PageAggregator {
        let engine = OcrEngine::new(backend, config.clone());
        PageAggregator::new(engine, config)
    }

    #[test]
    fn test_out_of_order_completion_preserves_page_order() {
        // Page 1 finishes last, page 3 first; the aggregate must read as
        // if processed sequentially.
        let backend = Arc::new(PagedBackend::new(vec![
            (10, "alpha", 0.9, 40),
            (20, "beta", 0.9, 15),
            (30, "gamma", 0.9, 0),
        ]));
        let aggregator = aggregator(backend, OcrConfig::default());

        let images = vec![image_of_width(10), image_of_width(20), image_of_width(30)];
        let doc = aggregator.extract(&images, &CancelToken::new()).unwrap();

        assert_eq!(doc.text, "alpha\u{0C}beta\u{0C}gamma");
        assert_eq!(
            doc.pages.iter().map(|p| p.page).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn test_low_confidence_page_is_retried() {
        let backend = Arc::new(PagedBackend::new(vec![(10, "faint", 0.2, 0)]));
        let calls = Arc::clone(&backend);
        let config = OcrConfig {
            max_retries: 3,
            ..OcrConfig::default()
        };
        let aggregator = aggregator(backend, config);

        let doc = aggregator
            .extract(&[image_of_width(10)], &CancelToken::new())
            .unwrap();

        // Never reached threshold: best attempt kept, all retries spent.
        assert_eq!(doc.pages[0].text, "faint");
        assert!((doc.pages[0].confidence - 0.2).abs() < 1e-6);
        assert_eq!(calls.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_confident_page_is_not_retried() {
        let backend = Arc::new(PagedBackend::new(vec![(10, "crisp", 0.95, 0)]));
        let calls = Arc::clone(&backend);
        let aggregator = aggregator(backend, OcrConfig::default());

        aggregator
            .extract(&[image_of_width(10)], &CancelToken::new())
            .unwrap();
        assert_eq!(calls.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cancelled_token_aborts_extraction() {
        let backend = Arc::new(PagedBackend::new(vec![(10, "text", 0.9, 0)]));
        let aggregator = aggregator(backend, OcrConfig::default());

        let cancel = CancelToken::new();
        cancel.cancel();
        let result = aggregator.extract(&[image_of_width(10)], &cancel);
        assert!(matches!(result, Err(OcrError::Cancelled)));
    }

    #[test]
    fn test_separator_stripped_from_page_text() {
        let backend = Arc::new(PagedBackend::new(vec![(10, "a\u{0C}b", 0.9, 0)]));
        let aggregator = aggregator(backend, OcrConfig::default());

        let doc = aggregator
            .extract(&[image_of_width(10)], &CancelToken::new())
            .unwrap();
        assert_eq!(doc.pages[0].text, "a b");
    }
}
