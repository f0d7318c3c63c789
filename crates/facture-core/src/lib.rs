//! Core library for invoice OCR processing.
//!
//! This crate provides:
//! - PDF page rasterization boundary (embedded images and text layer)
//! - OCR pipeline with preprocessing retries and per-page confidence
//! - Pattern-based field extraction (dates, amounts, invoice numbers)
//! - Tiered business identity resolution with usage learning

pub mod cancel;
pub mod error;
pub mod invoice;
pub mod matching;
pub mod models;
pub mod ocr;
pub mod pdf;

pub use cancel::CancelToken;
pub use error::{FactureError, MatchError, OcrError, RasterError, Result, StoreError};
pub use invoice::{
    FieldValue, InvoiceExtractionKind, InvoiceParser, ParseOutcome, PatternField, extract_field,
};
pub use matching::{BusinessResolver, FuzzyMatcher, KeywordStore, MemoryStore};
pub use models::business::{Business, Keyword, MatchKind, MatchResult};
pub use models::config::{FactureConfig, MatchingConfig, OcrConfig, ScoringConfig};
pub use models::result::{ExtractionResult, FieldKind};
pub use ocr::{DocumentText, OcrEngine, PageAggregator, PageText, Recognition, RecognitionBackend, TextSource};
pub use pdf::{PageRasterizer, PdfRasterizer};

#[cfg(feature = "tesseract")]
pub use ocr::TesseractBackend;
