//! PDF page rasterisation via pdfium.
//!
//! Used when a page source is a PDF rather than an image: the selected page is
//! rendered to a `DynamicImage`, then [`crate::pipeline::encode`] turns it
//! into a PNG data URI the model can read.
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps the pdfium C++ library, which is CPU-bound and not
//! async-aware. `tokio::task::spawn_blocking` keeps the Tokio worker threads
//! free while a page renders.
//!
//! ## Why cap pixels, not DPI?
//!
//! Page sizes vary wildly: an A0 poster at 150 DPI would produce a
//! 12,000 × 17,000 px image. `max_rendered_pixels` caps the longest edge
//! regardless of physical size.

use crate::error::Page2MdError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Bind to pdfium: `PDFIUM_LIB_PATH` if set, otherwise the system library.
pub fn bind_pdfium() -> Result<Pdfium, Page2MdError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(path) if !path.is_empty() => Pdfium::bind_to_library(&path),
        _ => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| Page2MdError::PdfiumBindingFailed(e.to_string()))?;
    Ok(Pdfium::new(bindings))
}

/// Rasterise one page (1-indexed) of a PDF.
pub async fn render_page(
    pdf_path: &Path,
    page_num: usize,
    max_pixels: u32,
) -> Result<DynamicImage, Page2MdError> {
    let path = pdf_path.to_path_buf();

    tokio::task::spawn_blocking(move || render_page_blocking(&path, page_num, max_pixels))
        .await
        .map_err(|e| Page2MdError::Internal(format!("Render task panicked: {}", e)))?
}

/// Blocking implementation of page rendering.
fn render_page_blocking(
    pdf_path: &Path,
    page_num: usize,
    max_pixels: u32,
) -> Result<DynamicImage, Page2MdError> {
    let pdfium = bind_pdfium()?;
    let failed = |detail: String| Page2MdError::RasterisationFailed {
        page: page_num,
        detail,
    };

    let document = pdfium
        .load_pdf_from_file(pdf_path, None)
        .map_err(|e| failed(format!("cannot open {}: {:?}", pdf_path.display(), e)))?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("PDF loaded: {} pages", total_pages);

    if page_num == 0 || page_num > total_pages {
        return Err(failed(format!(
            "page out of range (document has {total_pages} pages)"
        )));
    }

    let render_config = PdfRenderConfig::new()
        .set_target_width(max_pixels as i32)
        .set_maximum_height(max_pixels as i32);

    let page = pages
        .get((page_num - 1) as u16)
        .map_err(|e| failed(format!("{:?}", e)))?;

    let bitmap = page
        .render_with_config(&render_config)
        .map_err(|e| failed(format!("{:?}", e)))?;

    let image = bitmap.as_image();
    debug!(
        "Rendered page {} → {}x{} px",
        page_num,
        image.width(),
        image.height()
    );

    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_is_an_error_not_a_panic() {
        // Either pdfium is unavailable (binding error) or the file is missing
        // (rasterisation error); both must surface as Err.
        let result = render_page(Path::new("/definitely/not/here.pdf"), 1, 500).await;
        assert!(matches!(
            result,
            Err(Page2MdError::PdfiumBindingFailed(_)) | Err(Page2MdError::RasterisationFailed { .. })
        ));
    }
}
