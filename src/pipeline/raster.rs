//! PDF rasterisation: render every page to `page_NNN.png` via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async contexts.
//! `tokio::task::spawn_blocking` moves the work onto a dedicated blocking
//! thread, so the runtime (and whatever UI drives it) stays responsive.
//!
//! ## Handle lifetime
//!
//! The pdfium bindings and the loaded document live only inside
//! [`render_to_dir_blocking`]; both are dropped on every return path,
//! including a failure halfway through the page loop.
//!
//! ## Partial output
//!
//! When page K fails, pages 1..K-1 stay on disk and the error names page K.
//! Each page is written to a temp file and renamed, so a file with a final
//! `page_NNN.png` name is always a complete PNG.

use crate::config::ConversionConfig;
use crate::error::ConvertError;
use crate::progress::{callback_or_noop, ConversionProgressCallback};
use image::{DynamicImage, ImageFormat};
use pdfium_render::prelude::*;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Render all pages of `pdf_path` into `out_dir` at `config.zoom`.
///
/// This runs inside `spawn_blocking` since pdfium operations are CPU-bound.
///
/// # Returns
/// The written file paths, in page order.
pub async fn render_pages(
    pdf_path: &Path,
    out_dir: &Path,
    config: &ConversionConfig,
) -> Result<Vec<PathBuf>, ConvertError> {
    let path = pdf_path.to_path_buf();
    let dir = out_dir.to_path_buf();
    let config = config.clone();

    tokio::task::spawn_blocking(move || {
        let progress = callback_or_noop(&config.progress_callback);
        render_to_dir_blocking(&path, &dir, &config, progress.as_ref())
    })
    .await
    .map_err(|e| ConvertError::Internal(format!("Render task panicked: {}", e)))?
}

/// Blocking implementation of page rendering.
///
/// The destination directory is created only after the document opened
/// successfully.
pub fn render_to_dir_blocking(
    pdf_path: &Path,
    out_dir: &Path,
    config: &ConversionConfig,
    progress: &dyn ConversionProgressCallback,
) -> Result<Vec<PathBuf>, ConvertError> {
    let pdfium =
        pdfium_locate::bind_pdfium().map_err(|e| ConvertError::EngineUnavailable(e.to_string()))?;

    let document = pdfium
        .load_pdf_from_file(pdf_path, None)
        .map_err(|e| open_error(pdf_path, &e))?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("PDF loaded: {} pages", total_pages);

    std::fs::create_dir_all(out_dir).map_err(|e| ConvertError::io(out_dir, e))?;
    progress.on_conversion_start(total_pages);

    let scale = config.scale();
    let render_config = PdfRenderConfig::new()
        .scale_page_by_factor(scale)
        .set_clear_color(PdfColor::WHITE);

    let mut written = Vec::with_capacity(total_pages);

    for idx in 0..total_pages {
        let page_num = idx + 1;
        progress.on_item_start(page_num, total_pages);

        let target = out_dir.join(config.page_file_name(page_num));
        let result = render_page(&pages, idx, &render_config, &target).map(|()| target);

        match result {
            Ok(target) => {
                progress.on_item_complete(page_num, total_pages, &target);
                written.push(target);
            }
            Err(e) => {
                progress.on_item_error(page_num, total_pages, &e.to_string());
                return Err(e);
            }
        }
    }

    info!(
        "Wrote {} page images to {} at {}%",
        written.len(),
        out_dir.display(),
        config.zoom
    );
    progress.on_conversion_complete(total_pages);
    Ok(written)
}

/// Render page `idx` (0-based) and write it to `target`.
///
/// The page and its bitmap are dropped before returning.
fn render_page(
    pages: &PdfPages<'_>,
    idx: usize,
    render_config: &PdfRenderConfig,
    target: &Path,
) -> Result<(), ConvertError> {
    let page_num = idx + 1;
    let page = pages
        .get(idx as u16)
        .map_err(|e| ConvertError::RenderFailed {
            page: page_num,
            detail: format!("{:?}", e),
        })?;

    let bitmap = page
        .render_with_config(render_config)
        .map_err(|e| ConvertError::RenderFailed {
            page: page_num,
            detail: format!("{:?}", e),
        })?;

    let image = flatten(bitmap.as_image());
    debug!(
        "Rendered page {} → {}x{} px",
        page_num,
        image.width(),
        image.height()
    );
    write_png(&image, target, page_num)
}

fn open_error(pdf_path: &Path, e: &PdfiumError) -> ConvertError {
    let err_str = format!("{:?}", e);
    let detail = if err_str.contains("Password") || err_str.contains("password") {
        "the PDF is encrypted and requires a password".to_string()
    } else {
        err_str
    };
    ConvertError::OpenFailed {
        path: pdf_path.to_path_buf(),
        detail,
    }
}

/// Drop any alpha channel; pdfium already painted the opaque background.
fn flatten(image: DynamicImage) -> DynamicImage {
    match image {
        DynamicImage::ImageRgb8(_) => image,
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    }
}

/// PNG-encode `image` and move it into place at `target`.
fn write_png(image: &DynamicImage, target: &Path, page_num: usize) -> Result<(), ConvertError> {
    let mut buf = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| ConvertError::RenderFailed {
            page: page_num,
            detail: format!("PNG encoding failed: {}", e),
        })?;

    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::Builder::new()
        .prefix(".pdfimg-")
        .suffix(".png.tmp")
        .tempfile_in(dir)
        .map_err(|e| ConvertError::io(dir, e))?;
    tmp.write_all(&buf)
        .map_err(|e| ConvertError::io(target, e))?;
    tmp.persist(target)
        .map_err(|e| ConvertError::io(target, e.error))?;
    Ok(())
}
