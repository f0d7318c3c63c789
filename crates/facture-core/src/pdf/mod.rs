//! PDF page rasterization boundary.

mod rasterizer;

pub use rasterizer::PdfRasterizer;

use std::path::Path;

use image::DynamicImage;

use crate::error::RasterError;

/// Converts a PDF into page images (and optionally exposes its embedded
/// text layer).
///
/// The core consumes this boundary; the default [`PdfRasterizer`] covers
/// scanned invoices whose pages are embedded full-page images, and callers
/// with a full renderer (poppler, pdfium) can supply their own.
pub trait PageRasterizer: Send + Sync {
    /// Render every page to an image, in ascending page order.
    fn rasterize(&self, path: &Path) -> Result<Vec<DynamicImage>, RasterError>;

    /// The PDF's embedded text layer, when it has a usable one.
    ///
    /// Returning `None` means "no trusted upstream text"; the caller then
    /// runs OCR.
    fn embedded_text(&self, path: &Path) -> Result<Option<String>, RasterError>;
}
