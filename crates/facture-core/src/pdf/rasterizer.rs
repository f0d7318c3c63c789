//! Default rasterizer for scanned invoices using lopdf and pdf-extract.

use std::path::Path;

use image::{DynamicImage, ImageBuffer, Luma, Rgb};
use lopdf::{Document, Object, ObjectId};
use tracing::{debug, trace, warn};

use crate::error::RasterError;

use super::PageRasterizer;

/// Rasterizer for scanned PDFs.
///
/// Scanned invoices carry each page as one embedded image XObject; this
/// implementation extracts the largest image per page rather than running a
/// full content-stream renderer. The embedded text layer is probed with
/// `pdf-extract` for digitally produced invoices.
pub struct PdfRasterizer;

impl PdfRasterizer {
    pub fn new() -> Self {
        Self
    }

    fn load_document(&self, path: &Path) -> Result<Document, RasterError> {
        let mut doc = Document::load(path).map_err(|e| RasterError::Parse(e.to_string()))?;

        if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(RasterError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");
        }

        if doc.get_pages().is_empty() {
            return Err(RasterError::NoPages);
        }
        Ok(doc)
    }

    /// Extract the page's image XObjects and keep the largest, which for a
    /// scan is the full-page raster.
    fn page_image(
        &self,
        doc: &Document,
        page: u32,
        page_id: ObjectId,
    ) -> Result<DynamicImage, RasterError> {
        let mut images = Vec::new();

        if let Some(resources) = self.page_resources(doc, page_id) {
            if let Ok(xobjects) = resources.get(b"XObject") {
                if let Ok((_, Object::Dictionary(xobjects))) = doc.dereference(xobjects) {
                    for (_, reference) in xobjects.iter() {
                        if let Ok((_, object)) = doc.dereference(reference) {
                            if let Some(image) = self.decode_image_object(doc, object) {
                                images.push(image);
                            }
                        }
                    }
                }
            }
        }

        images
            .into_iter()
            .max_by_key(|img| u64::from(img.width()) * u64::from(img.height()))
            .ok_or_else(|| RasterError::PageRender {
                page,
                reason: "no decodable page image".to_string(),
            })
    }

    /// Resources may be inherited from ancestor page-tree nodes.
    fn page_resources(&self, doc: &Document, node_id: ObjectId) -> Option<lopdf::Dictionary> {
        let node = doc.get_object(node_id).ok()?;
        let dict = node.as_dict().ok()?;

        if let Ok(resources) = dict.get(b"Resources") {
            if let Ok((_, Object::Dictionary(resources))) = doc.dereference(resources) {
                return Some(resources.clone());
            }
        }

        match dict.get(b"Parent") {
            Ok(Object::Reference(parent)) => self.page_resources(doc, *parent),
            _ => None,
        }
    }

    fn decode_image_object(&self, doc: &Document, object: &Object) -> Option<DynamicImage> {
        let Object::Stream(stream) = object else {
            return None;
        };
        let dict = &stream.dict;

        if dict.get(b"Subtype").ok()?.as_name().ok()? != b"Image" {
            return None;
        }

        let width = dict.get(b"Width").ok()?.as_i64().ok()? as u32;
        let height = dict.get(b"Height").ok()?.as_i64().ok()? as u32;
        trace!("Found image XObject {}x{}", width, height);

        let filter = dict.get(b"Filter").ok().and_then(|f| match f {
            Object::Name(name) => Some(name.as_slice()),
            Object::Array(array) => array.first().and_then(|o| o.as_name().ok()),
            _ => None,
        });

        if filter == Some(b"DCTDecode") {
            return image::load_from_memory_with_format(&stream.content, image::ImageFormat::Jpeg)
                .ok();
        }
        if matches!(
            filter,
            Some(b"JPXDecode") | Some(b"CCITTFaxDecode") | Some(b"JBIG2Decode")
        ) {
            trace!("Unsupported image filter, skipping");
            return None;
        }

        let data = stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone());

        let bits = dict
            .get(b"BitsPerComponent")
            .ok()
            .and_then(|o| o.as_i64().ok())
            .unwrap_or(8);
        if bits != 8 {
            return None;
        }

        let color_space = dict
            .get(b"ColorSpace")
            .ok()
            .and_then(|o| match o {
                Object::Name(name) => Some(name.as_slice()),
                Object::Array(array) => array.first().and_then(|o| o.as_name().ok()),
                Object::Reference(r) => doc.get_object(*r).ok().and_then(|o| o.as_name().ok()),
                _ => None,
            })
            .unwrap_or(b"DeviceRGB");

        match color_space {
            b"DeviceGray" | b"G" | b"CalGray" => {
                let expected = (width * height) as usize;
                if data.len() < expected {
                    return None;
                }
                ImageBuffer::<Luma<u8>, _>::from_raw(width, height, data[..expected].to_vec())
                    .map(DynamicImage::ImageLuma8)
            }
            _ => {
                let expected = (width * height * 3) as usize;
                if data.len() < expected {
                    return None;
                }
                ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, data[..expected].to_vec())
                    .map(DynamicImage::ImageRgb8)
            }
        }
    }
}

impl Default for PdfRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl PageRasterizer for PdfRasterizer {
    fn rasterize(&self, path: &Path) -> Result<Vec<DynamicImage>, RasterError> {
        let doc = self.load_document(path)?;
        let pages = doc.get_pages();
        debug!("Rasterizing {} pages from {}", pages.len(), path.display());

        pages
            .iter()
            .map(|(&page, &page_id)| self.page_image(&doc, page, page_id))
            .collect()
    }

    fn embedded_text(&self, path: &Path) -> Result<Option<String>, RasterError> {
        match pdf_extract::extract_text(path) {
            Ok(text) if !text.trim().is_empty() => Ok(Some(text)),
            Ok(_) => Ok(None),
            Err(e) => {
                // A missing text layer is normal for scans; fall through to
                // OCR instead of failing the parse.
                warn!("Embedded text probe failed for {}: {}", path.display(), e);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_a_parse_error() {
        let rasterizer = PdfRasterizer::new();
        let result = rasterizer.rasterize(Path::new("/nonexistent/invoice.pdf"));
        assert!(matches!(result, Err(RasterError::Parse(_))));
    }

    #[test]
    fn test_missing_file_has_no_embedded_text() {
        let rasterizer = PdfRasterizer::new();
        let text = rasterizer
            .embedded_text(Path::new("/nonexistent/invoice.pdf"))
            .unwrap();
        assert!(text.is_none());
    }
}
