//! Image preprocessing: make a rendered page easier for Tesseract to read.
//!
//! Steps, in order:
//! 1. 8-bit grayscale
//! 2. 3×3 sharpen (`[-2 -2 -2; -2 32 -2; -2 -2 -2] / 16`, borders copied)
//! 3. contrast ×1.5 around the mean intensity
//! 4. Otsu global threshold → pure black/white
//! 5. morphological opening with a 1×1 element
//!
//! Step 5 cannot change a binary image at that size; it stays so the output
//! matches the reference pipeline pixel for pixel.
//!
//! Preprocessing must never stop a page from being recognised:
//! [`preprocess_or_original`] turns any error or panic into a fallback to the
//! untouched raster.

use crate::error::{PageError, PreprocessError};
use image::{DynamicImage, GrayImage, Luma};
use imageproc::contrast::{otsu_level, threshold, ThresholdType};
use imageproc::distance_transform::Norm;
use imageproc::morphology::open;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{debug, warn};

/// Contrast gain applied around the mean intensity.
pub const CONTRAST_FACTOR: f32 = 1.5;

const SHARPEN_KERNEL: [[f32; 3]; 3] = [
    [-2.0, -2.0, -2.0],
    [-2.0, 32.0, -2.0],
    [-2.0, -2.0, -2.0],
];
const SHARPEN_SCALE: f32 = 16.0;

/// Run the full preprocessing chain on one page image.
pub fn preprocess(image: &DynamicImage) -> Result<GrayImage, PreprocessError> {
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return Err(PreprocessError::EmptyImage { width, height });
    }

    let gray = image.to_luma8();
    let sharpened = sharpen(&gray);
    let contrasted = enhance_contrast(&sharpened, CONTRAST_FACTOR);

    let level = otsu_level(&contrasted);
    debug!("Otsu threshold: {}", level);
    let binary = threshold(&contrasted, level, ThresholdType::Binary);

    // 1×1 structuring element: k = 0 under the chessboard norm.
    Ok(open(&binary, Norm::LInf, 0))
}

/// Preprocess, or hand back the original image if anything goes wrong.
///
/// Returns the image to OCR and, on fallback, the error to record for the page.
pub fn preprocess_or_original(
    image: DynamicImage,
    page_num: usize,
) -> (DynamicImage, Option<PageError>) {
    guarded(image, page_num, preprocess)
}

/// Run `chain` on `image`, falling back to `image` on error or panic.
fn guarded(
    image: DynamicImage,
    page_num: usize,
    chain: fn(&DynamicImage) -> Result<GrayImage, PreprocessError>,
) -> (DynamicImage, Option<PageError>) {
    let outcome = catch_unwind(AssertUnwindSafe(|| chain(&image))).unwrap_or_else(|panic| {
        let detail = panic
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Err(PreprocessError::Panicked(detail))
    });

    match outcome {
        Ok(processed) => (DynamicImage::ImageLuma8(processed), None),
        Err(e) => {
            warn!("Page {}: preprocessing failed, using original image: {}", page_num, e);
            (
                image,
                Some(PageError::PreprocessFailed {
                    page: page_num,
                    detail: e.to_string(),
                }),
            )
        }
    }
}

/// 3×3 convolution with the sharpen kernel. The outermost ring of pixels is
/// copied unchanged.
fn sharpen(img: &GrayImage) -> GrayImage {
    let (width, height) = img.dimensions();
    let mut out = img.clone();
    if width < 3 || height < 3 {
        return out;
    }

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let mut sum = 0.0;
            for (ky, row) in SHARPEN_KERNEL.iter().enumerate() {
                for (kx, weight) in row.iter().enumerate() {
                    let px = img.get_pixel(x + kx as u32 - 1, y + ky as u32 - 1)[0] as f32;
                    sum += px * weight;
                }
            }
            let value = (sum / SHARPEN_SCALE).round().clamp(0.0, 255.0) as u8;
            out.put_pixel(x, y, Luma([value]));
        }
    }

    out
}

/// Scale each pixel's distance from the rounded mean intensity by `factor`.
fn enhance_contrast(img: &GrayImage, factor: f32) -> GrayImage {
    let total: u64 = img.pixels().map(|p| p[0] as u64).sum();
    let count = (img.width() as u64 * img.height() as u64).max(1);
    let mean = (total as f32 / count as f32).round();

    let mut out = img.clone();
    for p in out.pixels_mut() {
        let v = mean + factor * (p[0] as f32 - mean);
        p[0] = v.round().clamp(0.0, 255.0) as u8;
    }
    out
}
