//! PDF rasterisation: every page to a `DynamicImage` via pdfium.
//!
//! pdfium keeps thread-local state and is not async-safe, so rendering runs
//! on tokio's blocking pool. The whole document is rendered up front; each
//! image is then moved into exactly one OCR worker.

use crate::error::PdfSumError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// PDF points per inch; pdfium page sizes are in points.
const POINTS_PER_INCH: f32 = 72.0;

/// Turns a PDF file into one raster image per page, in page order.
pub trait PageRenderer: Send + Sync {
    fn render(&self, pdf_path: &Path, dpi: u32) -> Result<Vec<DynamicImage>, PdfSumError>;
}

/// [`PageRenderer`] backed by the pdfium shared library.
#[derive(Debug, Clone, Default)]
pub struct PdfiumRenderer {
    /// Directory holding `libpdfium`; `None` binds the system library.
    library_dir: Option<PathBuf>,
}

impl PdfiumRenderer {
    pub fn new(library_dir: Option<PathBuf>) -> Self {
        Self { library_dir }
    }

    fn bind(&self) -> Result<Pdfium, PdfSumError> {
        let bindings = match &self.library_dir {
            Some(dir) => {
                debug!("Binding pdfium from {}", dir.display());
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))
            }
            None => Pdfium::bind_to_system_library(),
        }
        .map_err(|e| PdfSumError::RendererUnavailable(format!("{e:?}")))?;

        Ok(Pdfium::new(bindings))
    }
}

impl PageRenderer for PdfiumRenderer {
    fn render(&self, pdf_path: &Path, dpi: u32) -> Result<Vec<DynamicImage>, PdfSumError> {
        let pdfium = self.bind()?;

        let document =
            pdfium
                .load_pdf_from_file(pdf_path, None)
                .map_err(|e| PdfSumError::CorruptPdf {
                    path: pdf_path.to_path_buf(),
                    detail: format!("{e:?}"),
                })?;

        let pages = document.pages();
        let total_pages = pages.len();
        info!("PDF loaded: {} pages", total_pages);

        let render_config =
            PdfRenderConfig::new().scale_page_by_factor(dpi as f32 / POINTS_PER_INCH);

        let mut images = Vec::with_capacity(total_pages as usize);
        for idx in 0..total_pages {
            let page_num = idx as usize + 1;
            let page = pages
                .get(idx)
                .map_err(|e| PdfSumError::RasterisationFailed {
                    page: page_num,
                    detail: format!("{e:?}"),
                })?;

            let bitmap = page.render_with_config(&render_config).map_err(|e| {
                PdfSumError::RasterisationFailed {
                    page: page_num,
                    detail: format!("{e:?}"),
                }
            })?;

            let image = bitmap.as_image();
            debug!(
                "Rendered page {} → {}x{} px",
                page_num,
                image.width(),
                image.height()
            );
            images.push(image);
        }

        Ok(images)
    }
}

/// Rasterise every page of `pdf_path` at `dpi` on the blocking pool.
pub async fn render_document(
    renderer: Arc<dyn PageRenderer>,
    pdf_path: &Path,
    dpi: u32,
) -> Result<Vec<DynamicImage>, PdfSumError> {
    let path = pdf_path.to_path_buf();
    info!("Rendering {} at {} DPI", path.display(), dpi);

    tokio::task::spawn_blocking(move || renderer.render(&path, dpi))
        .await
        .map_err(|e| PdfSumError::Internal(format!("Render task panicked: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    struct FixedRenderer(usize);

    impl PageRenderer for FixedRenderer {
        fn render(&self, _pdf_path: &Path, dpi: u32) -> Result<Vec<DynamicImage>, PdfSumError> {
            assert_eq!(dpi, 200);
            Ok((0..self.0)
                .map(|i| DynamicImage::ImageLuma8(GrayImage::from_pixel(4, 4, Luma([i as u8]))))
                .collect())
        }
    }

    struct BrokenRenderer;

    impl PageRenderer for BrokenRenderer {
        fn render(&self, pdf_path: &Path, _dpi: u32) -> Result<Vec<DynamicImage>, PdfSumError> {
            Err(PdfSumError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: "bad xref".into(),
            })
        }
    }

    #[tokio::test]
    async fn render_document_keeps_page_order() {
        let images = render_document(Arc::new(FixedRenderer(3)), Path::new("x.pdf"), 200)
            .await
            .unwrap();
        assert_eq!(images.len(), 3);
        for (i, img) in images.iter().enumerate() {
            assert_eq!(img.to_luma8().get_pixel(0, 0)[0], i as u8);
        }
    }

    #[tokio::test]
    async fn render_document_propagates_failure() {
        let err = render_document(Arc::new(BrokenRenderer), Path::new("bad.pdf"), 200)
            .await
            .unwrap_err();
        assert!(matches!(err, PdfSumError::CorruptPdf { .. }));
    }
}
