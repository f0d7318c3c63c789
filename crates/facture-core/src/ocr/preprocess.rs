//! Image preprocessing for OCR.
//!
//! Intensity levels are strictly additive: each level applies every lower
//! level's transforms first. The input image is never mutated.

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage};
use imageproc::contrast::adaptive_threshold;
use imageproc::filter::median_filter;
use tracing::debug;

/// Highest preprocessing intensity.
pub const MAX_LEVEL: u8 = 3;

/// Deterministic page-image normalizer.
pub struct ImagePreprocessor {
    /// Pages whose short side is below this are upscaled before OCR.
    min_readable_side: u32,
    /// Radius of the denoising median filter.
    median_radius: u32,
    /// Block radius of the adaptive threshold.
    threshold_block_radius: u32,
}

impl ImagePreprocessor {
    pub fn new() -> Self {
        Self {
            min_readable_side: 600,
            median_radius: 1,
            threshold_block_radius: 12,
        }
    }

    /// Set the minimum readable short side in pixels.
    pub fn with_min_readable_side(mut self, pixels: u32) -> Self {
        self.min_readable_side = pixels;
        self
    }

    /// Apply the transforms for `level` (clamped to [`MAX_LEVEL`]):
    ///
    /// - 0: identity
    /// - 1: grayscale + upscale of small pages
    /// - 2: level 1 + median denoise
    /// - 3: level 2 + adaptive threshold binarization
    pub fn apply(&self, image: &DynamicImage, level: u8) -> DynamicImage {
        let level = level.min(MAX_LEVEL);
        if level == 0 {
            return image.clone();
        }

        let mut gray = self.to_readable_gray(image);
        if level >= 2 {
            gray = median_filter(&gray, self.median_radius, self.median_radius);
        }
        if level >= 3 {
            gray = adaptive_threshold(&gray, self.threshold_block_radius);
        }

        DynamicImage::ImageLuma8(gray)
    }

    fn to_readable_gray(&self, image: &DynamicImage) -> GrayImage {
        let gray = image.to_luma8();
        let (width, height) = gray.dimensions();
        let short_side = width.min(height).max(1);

        if short_side >= self.min_readable_side {
            return gray;
        }

        let scale = self.min_readable_side as f32 / short_side as f32;
        let new_width = ((width as f32 * scale) as u32).max(1);
        let new_height = ((height as f32 * scale) as u32).max(1);
        debug!(
            "Upscaling page image {}x{} -> {}x{}",
            width, height, new_width, new_height
        );

        image::imageops::resize(&gray, new_width, new_height, FilterType::CatmullRom)
    }
}

impl Default for ImagePreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn sample_image() -> DynamicImage {
        let buffer = image::RgbImage::from_fn(64, 48, |x, y| {
            if (x + y) % 7 == 0 {
                Rgb([0, 0, 0])
            } else {
                Rgb([240, 240, 240])
            }
        });
        DynamicImage::ImageRgb8(buffer)
    }

    #[test]
    fn test_level_zero_is_identity() {
        let preprocessor = ImagePreprocessor::new();
        let image = sample_image();
        let out = preprocessor.apply(&image, 0);
        assert_eq!(out.as_bytes(), image.as_bytes());
    }

    #[test]
    fn test_deterministic_per_level() {
        let preprocessor = ImagePreprocessor::new().with_min_readable_side(32);
        let image = sample_image();
        for level in 0..=MAX_LEVEL {
            let a = preprocessor.apply(&image, level);
            let b = preprocessor.apply(&image, level);
            assert_eq!(a.as_bytes(), b.as_bytes(), "level {} not deterministic", level);
        }
    }

    #[test]
    fn test_level_one_converts_to_gray() {
        let preprocessor = ImagePreprocessor::new().with_min_readable_side(32);
        let out = preprocessor.apply(&sample_image(), 1);
        assert!(matches!(out, DynamicImage::ImageLuma8(_)));
        assert_eq!(out.width(), 64);
    }

    #[test]
    fn test_small_image_is_upscaled() {
        let preprocessor = ImagePreprocessor::new().with_min_readable_side(96);
        let out = preprocessor.apply(&sample_image(), 1);
        assert!(out.height() >= 96);
    }

    #[test]
    fn test_input_not_mutated() {
        let preprocessor = ImagePreprocessor::new();
        let image = sample_image();
        let before = image.as_bytes().to_vec();
        let _ = preprocessor.apply(&image, MAX_LEVEL);
        assert_eq!(image.as_bytes(), &before[..]);
    }

    #[test]
    fn test_level_clamped_to_max() {
        let preprocessor = ImagePreprocessor::new().with_min_readable_side(32);
        let at_max = preprocessor.apply(&sample_image(), MAX_LEVEL);
        let beyond = preprocessor.apply(&sample_image(), MAX_LEVEL + 5);
        assert_eq!(at_max.as_bytes(), beyond.as_bytes());
    }
}
