//! OCR engine: backend invocation with confidence normalization and an
//! optional hard per-page time bound.

use std::sync::Arc;
use std::sync::mpsc;
use std::time::Duration;

use image::DynamicImage;
use tracing::{debug, warn};

use crate::error::OcrError;
use crate::models::config::OcrConfig;

use super::backend::{Recognition, RecognitionBackend};

/// Runs text recognition on one preprocessed page image.
pub struct OcrEngine {
    backend: Arc<dyn RecognitionBackend>,
    config: OcrConfig,
}

impl OcrEngine {
    pub fn new(backend: Arc<dyn RecognitionBackend>, config: OcrConfig) -> Self {
        Self { backend, config }
    }

    pub fn config(&self) -> &OcrConfig {
        &self.config
    }

    /// Recognize text in one image with the configured language.
    ///
    /// Empty recognized text is not an error; its confidence is forced to
    /// 0.0. All confidences are clamped to [0, 1].
    pub fn recognize(&self, image: &DynamicImage) -> Result<Recognition, OcrError> {
        let mut recognition = self.backend.recognize(image, &self.config.language)?;
        recognition.confidence = recognition.confidence.clamp(0.0, 1.0);
        if recognition.text.trim().is_empty() {
            recognition.text.clear();
            recognition.confidence = 0.0;
        }
        debug!(
            "Recognized {} characters at confidence {:.2}",
            recognition.text.len(),
            recognition.confidence
        );
        Ok(recognition)
    }

    /// Like [`recognize`](Self::recognize), but bounded by the configured
    /// per-page timeout when one is set.
    ///
    /// A timed-out attempt yields an empty, zero-confidence recognition so
    /// the caller's retry budget treats it like any other failed attempt.
    pub fn recognize_bounded(&self, image: &DynamicImage) -> Result<Recognition, OcrError> {
        let Some(timeout_ms) = self.config.page_timeout_ms else {
            return self.recognize(image);
        };

        let backend = Arc::clone(&self.backend);
        let language = self.config.language.clone();
        let image = image.clone();
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || {
            let result = backend.recognize(&image, &language);
            let _ = tx.send(result);
        });

        match rx.recv_timeout(Duration::from_millis(timeout_ms)) {
            Ok(result) => {
                let mut recognition = result?;
                recognition.confidence = recognition.confidence.clamp(0.0, 1.0);
                if recognition.text.trim().is_empty() {
                    recognition.text.clear();
                    recognition.confidence = 0.0;
                }
                Ok(recognition)
            }
            Err(_) => {
                warn!("Page recognition exceeded {}ms, counting as failed attempt", timeout_ms);
                Ok(Recognition {
                    text: String::new(),
                    confidence: 0.0,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    struct ScriptedBackend {
        text: &'static str,
        confidence: f32,
        delay: Option<Duration>,
    }

    impl RecognitionBackend for ScriptedBackend {
        fn recognize(&self, _image: &DynamicImage, _language: &str) -> Result<Recognition, OcrError> {
            if let Some(delay) = self.delay {
                std::thread::sleep(delay);
            }
            Ok(Recognition {
                text: self.text.to_string(),
                confidence: self.confidence,
            })
        }
    }

    fn blank_image() -> DynamicImage {
        DynamicImage::new_luma8(8, 8)
    }

    #[test]
    fn test_empty_text_forces_zero_confidence() {
        let engine = OcrEngine::new(
            Arc::new(ScriptedBackend {
                text: "   ",
                confidence: 0.9,
                delay: None,
            }),
            OcrConfig::default(),
        );
        let recognition = engine.recognize(&blank_image()).unwrap();
        assert_eq!(recognition.text, "");
        assert_eq!(recognition.confidence, 0.0);
    }

    #[test]
    fn test_confidence_clamped_to_unit_interval() {
        let engine = OcrEngine::new(
            Arc::new(ScriptedBackend {
                text: "hello",
                confidence: 1.7,
                delay: None,
            }),
            OcrConfig::default(),
        );
        let recognition = engine.recognize(&blank_image()).unwrap();
        assert_eq!(recognition.confidence, 1.0);
    }

    #[test]
    fn test_timeout_counts_as_failed_attempt() {
        let config = OcrConfig {
            page_timeout_ms: Some(20),
            ..OcrConfig::default()
        };
        let engine = OcrEngine::new(
            Arc::new(ScriptedBackend {
                text: "late",
                confidence: 0.95,
                delay: Some(Duration::from_millis(500)),
            }),
            config,
        );
        let recognition = engine.recognize_bounded(&blank_image()).unwrap();
        assert_eq!(recognition.text, "");
        assert_eq!(recognition.confidence, 0.0);
    }

    #[test]
    fn test_fast_backend_beats_timeout() {
        let config = OcrConfig {
            page_timeout_ms: Some(1_000),
            ..OcrConfig::default()
        };
        let engine = OcrEngine::new(
            Arc::new(ScriptedBackend {
                text: "prompt",
                confidence: 0.8,
                delay: None,
            }),
            config,
        );
        let recognition = engine.recognize_bounded(&blank_image()).unwrap();
        assert_eq!(recognition.text, "prompt");
    }
}
