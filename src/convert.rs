//! Conversion entry points.
//!
//! Both directions are stateless: one call is one job, from input validation
//! to the final file on disk. CPU-bound work (image decoding, PDF writing,
//! pdfium rendering) runs on Tokio's blocking pool.

use crate::config::ConversionConfig;
use crate::error::ConvertError;
use crate::output::{PackOutput, RasterOutput};
use crate::pipeline::{collect, input, pack, raster};
use crate::progress::callback_or_noop;
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Pack every supported image in `image_folder` into the PDF at `output_pdf`.
///
/// Images are taken from the folder itself (not subfolders) in natural name
/// order, one page each.
///
/// # Errors
/// - [`ConvertError::EmptyInput`] when the folder has no supported image;
///   nothing is written in that case
/// - [`ConvertError::PackingFailed`] when an image cannot be decoded
/// - [`ConvertError::IoFailed`] when the folder cannot be read or the PDF
///   cannot be written
///
/// # Example
/// ```rust,no_run
/// use pdfimg::{images_to_pdf, ConversionConfig};
/// use std::path::Path;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ConversionConfig::default();
/// let folder = Path::new("scans");
/// let out = images_to_pdf(folder, config.default_pdf_path(folder), &config).await?;
/// println!("{} pages → {}", out.page_count, out.output_path.display());
/// # Ok(())
/// # }
/// ```
pub async fn images_to_pdf(
    image_folder: impl AsRef<Path>,
    output_pdf: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<PackOutput, ConvertError> {
    let start = Instant::now();
    config.validate()?;

    let folder = image_folder.as_ref().to_path_buf();
    let output = output_pdf.as_ref().to_path_buf();
    info!("Packing images from {}", folder.display());

    let cfg = config.clone();
    let out = output.clone();
    let (images, page_count) = tokio::task::spawn_blocking(move || {
        let images = collect::collect_images(&folder)?;
        let progress = callback_or_noop(&cfg.progress_callback);
        let n = pack::pack_images(&images, &out, &cfg, progress.as_ref())?;
        Ok::<_, ConvertError>((images, n))
    })
    .await
    .map_err(|e| ConvertError::Internal(format!("Pack task panicked: {}", e)))??;

    let duration_ms = start.elapsed().as_millis() as u64;
    info!(
        "PDF written: {} ({} pages, {}ms)",
        output.display(),
        page_count,
        duration_ms
    );

    Ok(PackOutput {
        output_path: output,
        page_count,
        images,
        duration_ms,
    })
}

/// Render every page of `pdf_path` to `page_NNN.png` inside `output_dir`.
///
/// `output_dir` is created if missing, but only once the PDF has been opened
/// successfully: a file that is not a PDF leaves the destination untouched.
/// If a page fails, pages already written stay on disk.
///
/// # Errors
/// - [`ConvertError::OpenFailed`] for missing, unreadable or non-PDF input
/// - [`ConvertError::EngineUnavailable`] when no pdfium library is found
/// - [`ConvertError::RenderFailed`] when a page cannot be rendered
/// - [`ConvertError::IoFailed`] when the directory or a file cannot be written
pub async fn pdf_to_images(
    pdf_path: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<RasterOutput, ConvertError> {
    let start = Instant::now();
    config.validate()?;

    let pdf_path = input::validate_pdf(pdf_path.as_ref())?;
    let output_dir = output_dir.as_ref().to_path_buf();
    info!(
        "Rasterising {} at {}% → {}",
        pdf_path.display(),
        config.zoom,
        output_dir.display()
    );

    let pages = raster::render_pages(&pdf_path, &output_dir, config).await?;

    Ok(RasterOutput {
        output_dir,
        pages,
        zoom: config.zoom,
        duration_ms: start.elapsed().as_millis() as u64,
    })
}

/// Synchronous wrapper around [`images_to_pdf`].
///
/// Creates a temporary tokio runtime internally.
pub fn images_to_pdf_sync(
    image_folder: impl AsRef<Path>,
    output_pdf: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<PackOutput, ConvertError> {
    runtime()?.block_on(images_to_pdf(image_folder, output_pdf, config))
}

/// Synchronous wrapper around [`pdf_to_images`].
///
/// Creates a temporary tokio runtime internally.
pub fn pdf_to_images_sync(
    pdf_path: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<RasterOutput, ConvertError> {
    runtime()?.block_on(pdf_to_images(pdf_path, output_dir, config))
}

fn runtime() -> Result<tokio::runtime::Runtime, ConvertError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ConvertError::Internal(format!("Failed to create tokio runtime: {}", e)))
}
