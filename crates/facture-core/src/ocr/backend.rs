//! Text recognition backend boundary.

use image::DynamicImage;

use crate::error::OcrError;

/// Raw recognition output for one image.
#[derive(Debug, Clone, PartialEq)]
pub struct Recognition {
    pub text: String,
    /// Backend-reported mean confidence, normalized to [0, 1].
    pub confidence: f32,
}

/// A text recognition backend.
///
/// Implementations must be callable from the page worker pool; construction
/// or availability failures surface as [`OcrError::BackendUnavailable`] and
/// are never retried.
pub trait RecognitionBackend: Send + Sync {
    /// Recognize text in one page image.
    fn recognize(&self, image: &DynamicImage, language: &str) -> Result<Recognition, OcrError>;
}

/// Tesseract-backed recognition via `leptess`.
///
/// Requires system Tesseract/Leptonica; gated behind the `tesseract`
/// feature so the core builds and tests without them.
#[cfg(feature = "tesseract")]
pub struct TesseractBackend {
    datapath: Option<String>,
}

#[cfg(feature = "tesseract")]
impl TesseractBackend {
    /// Use the system-default tessdata directory.
    pub fn new() -> Self {
        Self { datapath: None }
    }

    /// Use an explicit tessdata directory.
    pub fn with_datapath(datapath: impl Into<String>) -> Self {
        Self {
            datapath: Some(datapath.into()),
        }
    }
}

#[cfg(feature = "tesseract")]
impl Default for TesseractBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "tesseract")]
impl RecognitionBackend for TesseractBackend {
    fn recognize(&self, image: &DynamicImage, language: &str) -> Result<Recognition, OcrError> {
        use std::io::Cursor;

        let mut tess = leptess::LepTess::new(self.datapath.as_deref(), language)
            .map_err(|e| OcrError::BackendUnavailable(e.to_string()))?;

        let mut png = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .map_err(|e| OcrError::Recognition(format!("failed to encode page: {}", e)))?;

        tess.set_image_from_mem(&png)
            .map_err(|e| OcrError::Recognition(format!("failed to load page: {}", e)))?;

        let text = tess
            .get_utf8_text()
            .map_err(|e| OcrError::Recognition(format!("recognition failed: {}", e)))?;

        // Tesseract reports mean word confidence as 0-100.
        let confidence = (tess.mean_text_conf().max(0) as f32 / 100.0).clamp(0.0, 1.0);

        Ok(Recognition {
            text: text.trim().to_string(),
            confidence,
        })
    }
}
