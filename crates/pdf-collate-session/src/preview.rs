//! Page preview rendering.
//!
//! Previews are rendered with pdfium behind the `previews` feature. A
//! missing pdfium library at runtime is not fatal: callers fall back to
//! metadata-only previews and loading still completes.

use pdf_collate::PagePreview;

#[cfg(feature = "previews")]
use pdfium_render::prelude::*;

/// Rendered preview bitmaps target this width in pixels.
#[cfg(feature = "previews")]
const PREVIEW_TARGET_WIDTH: i32 = 600;
#[cfg(feature = "previews")]
const PREVIEW_MAX_HEIGHT: i32 = 800;

/// Initialize Pdfium, trying the vendored library first, then falling back to system
#[cfg(feature = "previews")]
pub fn init_pdfium() -> Result<Pdfium, PdfiumError> {
    // Try to load from vendor directory (relative to workspace root)
    let vendor_path = std::env::current_dir().ok().and_then(|mut p| {
        p.push("vendor/pdfium/lib");
        if p.exists() { Some(p) } else { None }
    });

    if let Some(vendor_path) = vendor_path {
        if let Ok(binding) =
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&vendor_path))
        {
            return Ok(Pdfium::new(binding));
        }
    }

    Pdfium::bind_to_system_library().map(Pdfium::new)
}

/// Render one page of a source document to an RGBA preview.
///
/// `native_size` is the page's (width, height) in points, carried through to
/// the preview so consumers see native geometry rather than bitmap geometry.
#[cfg(feature = "previews")]
pub async fn render_page_preview(
    bytes: Vec<u8>,
    page_number: u32,
    native_size: (f32, f32),
) -> Result<PagePreview, String> {
    tokio::task::spawn_blocking(move || {
        let pdfium = init_pdfium().map_err(|e| format!("pdfium unavailable: {e}"))?;
        let document = pdfium
            .load_pdf_from_byte_slice(&bytes, None)
            .map_err(|e| format!("failed to open document: {e}"))?;
        let page = document
            .pages()
            .get((page_number - 1) as u16)
            .map_err(|e| format!("failed to get page {page_number}: {e}"))?;

        let config = PdfRenderConfig::new()
            .set_target_width(PREVIEW_TARGET_WIDTH)
            .set_maximum_height(PREVIEW_MAX_HEIGHT);

        let bitmap = page
            .render_with_config(&config)
            .map_err(|e| format!("failed to render page {page_number}: {e}"))?;

        Ok(PagePreview {
            page_number,
            width_pt: native_size.0,
            height_pt: native_size.1,
            pixel_width: bitmap.width() as u32,
            pixel_height: bitmap.height() as u32,
            rgba: bitmap.as_rgba_bytes().to_vec(),
        })
    })
    .await
    .map_err(|e| format!("task join error: {e}"))?
}

/// A preview with no bitmap, only the page's native geometry.
pub fn metadata_preview(page_number: u32, native_size: (f32, f32)) -> PagePreview {
    PagePreview {
        page_number,
        width_pt: native_size.0,
        height_pt: native_size.1,
        pixel_width: 0,
        pixel_height: 0,
        rgba: Vec::new(),
    }
}

/// Encode a rendered preview as PNG bytes.
pub fn preview_to_png(preview: &PagePreview) -> Result<Vec<u8>, String> {
    let image =
        image::RgbaImage::from_raw(preview.pixel_width, preview.pixel_height, preview.rgba.clone())
            .ok_or_else(|| "preview bitmap size mismatch".to_string())?;

    let mut png = std::io::Cursor::new(Vec::new());
    image
        .write_to(&mut png, image::ImageFormat::Png)
        .map_err(|e| format!("failed to encode PNG: {e}"))?;
    Ok(png.into_inner())
}
