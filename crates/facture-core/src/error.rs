//! Error types for the facture-core library.

use thiserror::Error;

/// Main error type for the facture library.
#[derive(Error, Debug)]
pub enum FactureError {
    /// Page rasterization error.
    #[error("raster error: {0}")]
    Raster(#[from] RasterError),

    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Business resolution error.
    #[error("match error: {0}")]
    Match(#[from] MatchError),

    /// Persistence boundary error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Image processing error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to rendering PDF pages into images.
#[derive(Error, Debug)]
pub enum RasterError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// A page could not be rendered to an image.
    #[error("failed to render page {page}: {reason}")]
    PageRender { page: u32, reason: String },
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// The recognition backend is missing or could not be initialized.
    /// Fatal: surfaced immediately, never retried.
    #[error("recognition backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Text recognition failed on an image.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// Image preprocessing failed.
    #[error("preprocessing failed: {0}")]
    Preprocess(String),

    /// A cancellation signal was observed mid-extraction.
    #[error("extraction cancelled")]
    Cancelled,
}

/// Errors from business/keyword registry management.
#[derive(Error, Debug)]
pub enum MatchError {
    /// The named business is not registered.
    #[error("unknown business: {0}")]
    UnknownBusiness(String),

    /// The business already exists.
    #[error("business already registered: {0}")]
    DuplicateBusiness(String),

    /// (business, keyword text, match kind) must be unique.
    #[error("keyword {keyword:?} ({kind}) already registered for {business}")]
    DuplicateKeyword {
        business: String,
        keyword: String,
        kind: String,
    },
}

/// Errors from the persistence collaborator.
///
/// Failures to persist keyword usage are downgraded to warnings inside the
/// resolver; this type still surfaces from registry loading.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store could not be reached or opened.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A write to the store failed.
    #[error("store write failed: {0}")]
    Write(String),
}

/// Result type for the facture library.
pub type Result<T> = std::result::Result<T, FactureError>;
