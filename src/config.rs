//! Configuration types for image/PDF conversion.
//!
//! All tunable behaviour lives in [`ConversionConfig`], built via its
//! [`ConversionConfigBuilder`]. The defaults reproduce the classic tool:
//! 200 % zoom, `output_images.pdf`, `<stem>_images/`, `page_NNN.png`.

use crate::error::ConvertError;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::{Path, PathBuf};

/// Image file extensions accepted by the collector (compared case-insensitively).
pub const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tiff", "gif"];

/// Default zoom percentage for rasterising (2× the PDF's 72-DPI space).
pub const DEFAULT_ZOOM: u32 = 200;

/// Default file name of the packed PDF, placed inside the source folder.
pub const DEFAULT_PDF_NAME: &str = "output_images.pdf";

/// Suffix appended to the PDF's stem to name the raster output directory.
pub const DEFAULT_IMAGE_DIR_SUFFIX: &str = "_images";

/// Page density used for images that declare none, when no `image_dpi` is set.
pub const FALLBACK_IMAGE_DPI: f32 = 72.0;

const MIN_ZOOM: u32 = 10;
const MAX_ZOOM: u32 = 1000;

/// Configuration shared by both conversion directions.
///
/// # Example
/// ```rust
/// use pdfimg::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .zoom(300)
///     .image_dpi(96.0)
///     .build()
///     .unwrap();
/// assert_eq!(config.scale(), 3.0);
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Rasterising zoom in percent, applied to both axes. Range: 10–1000. Default: 200.
    pub zoom: u32,

    /// Pixel density used to size every packed page. Default: None.
    ///
    /// When unset, each page uses the density its file declares (JFIF or PNG
    /// `pHYs`), falling back to [`FALLBACK_IMAGE_DPI`], where one pixel maps
    /// to one PDF point. Larger values give physically smaller pages with the
    /// same pixels.
    pub image_dpi: Option<f32>,

    /// Minimum digit count in `page_NNN.png`. Default: 3.
    pub page_number_width: usize,

    /// File name used by [`ConversionConfig::default_pdf_path`]. Default: `output_images.pdf`.
    pub pdf_file_name: String,

    /// Suffix used by [`ConversionConfig::default_image_dir`]. Default: `_images`.
    pub image_dir_suffix: String,

    /// Receives per-image / per-page events. Default: None.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            zoom: DEFAULT_ZOOM,
            image_dpi: None,
            page_number_width: 3,
            pdf_file_name: DEFAULT_PDF_NAME.to_string(),
            image_dir_suffix: DEFAULT_IMAGE_DIR_SUFFIX.to_string(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("zoom", &self.zoom)
            .field("image_dpi", &self.image_dpi)
            .field("page_number_width", &self.page_number_width)
            .field("pdf_file_name", &self.pdf_file_name)
            .field("image_dir_suffix", &self.image_dir_suffix)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Render scale factor derived from [`Self::zoom`].
    pub fn scale(&self) -> f32 {
        self.zoom as f32 / 100.0
    }

    /// File name for the 1-indexed page `page_num`, e.g. `page_007.png`.
    pub fn page_file_name(&self, page_num: usize) -> String {
        format!(
            "page_{:0width$}.png",
            page_num,
            width = self.page_number_width
        )
    }

    /// `<folder>/output_images.pdf`.
    pub fn default_pdf_path(&self, image_folder: &Path) -> PathBuf {
        image_folder.join(&self.pdf_file_name)
    }

    /// Check constraints on fields that may have been set directly.
    pub fn validate(&self) -> Result<(), ConvertError> {
        if !(MIN_ZOOM..=MAX_ZOOM).contains(&self.zoom) {
            return Err(ConvertError::InvalidConfig(format!(
                "zoom must be {MIN_ZOOM}–{MAX_ZOOM} %, got {}",
                self.zoom
            )));
        }
        if let Some(dpi) = self.image_dpi {
            if !dpi.is_finite() || dpi <= 0.0 {
                return Err(ConvertError::InvalidConfig(format!(
                    "image DPI must be a positive number, got {dpi}"
                )));
            }
        }
        if self.pdf_file_name.is_empty() || self.pdf_file_name.contains(['/', '\\']) {
            return Err(ConvertError::InvalidConfig(format!(
                "PDF file name must be a bare file name, got '{}'",
                self.pdf_file_name
            )));
        }
        Ok(())
    }

    /// `<parent>/<stem>_images` next to the source PDF.
    pub fn default_image_dir(&self, pdf_path: &Path) -> PathBuf {
        let stem = pdf_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let parent = pdf_path.parent().unwrap_or_else(|| Path::new(""));
        parent.join(format!("{stem}{}", self.image_dir_suffix))
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn zoom(mut self, zoom: u32) -> Self {
        self.config.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        self
    }

    pub fn image_dpi(mut self, dpi: f32) -> Self {
        self.config.image_dpi = Some(dpi);
        self
    }

    pub fn page_number_width(mut self, width: usize) -> Self {
        self.config.page_number_width = width.max(1);
        self
    }

    pub fn pdf_file_name(mut self, name: impl Into<String>) -> Self {
        self.config.pdf_file_name = name.into();
        self
    }

    pub fn image_dir_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.config.image_dir_suffix = suffix.into();
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, ConvertError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Whether `path` has one of [`SUPPORTED_EXTENSIONS`], ignoring case.
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|s| s.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_classic_tool() {
        let c = ConversionConfig::default();
        assert_eq!(c.zoom, 200);
        assert_eq!(c.scale(), 2.0);
        assert_eq!(c.page_file_name(1), "page_001.png");
        assert_eq!(c.page_file_name(42), "page_042.png");
        assert_eq!(c.image_dpi, None);
    }

    #[test]
    fn page_names_grow_past_width() {
        let c = ConversionConfig::default();
        assert_eq!(c.page_file_name(999), "page_999.png");
        assert_eq!(c.page_file_name(1000), "page_1000.png");
    }

    #[test]
    fn default_destinations() {
        let c = ConversionConfig::default();
        assert_eq!(
            c.default_pdf_path(Path::new("/scans/trip")),
            PathBuf::from("/scans/trip/output_images.pdf")
        );
        assert_eq!(
            c.default_image_dir(Path::new("/docs/report.v2.pdf")),
            PathBuf::from("/docs/report.v2_images")
        );
    }

    #[test]
    fn zoom_is_clamped_by_builder() {
        let c = ConversionConfig::builder().zoom(5).build().unwrap();
        assert_eq!(c.zoom, 10);
        let c = ConversionConfig::builder().zoom(50_000).build().unwrap();
        assert_eq!(c.zoom, 1000);
    }

    #[test]
    fn build_rejects_bad_dpi_and_names() {
        assert!(ConversionConfig::builder().image_dpi(0.0).build().is_err());
        assert!(ConversionConfig::builder()
            .image_dpi(f32::NAN)
            .build()
            .is_err());
        assert!(ConversionConfig::builder()
            .pdf_file_name("sub/out.pdf")
            .build()
            .is_err());
    }

    #[test]
    fn validate_catches_direct_field_edits() {
        let mut c = ConversionConfig::default();
        c.zoom = 0;
        assert!(matches!(c.validate(), Err(ConvertError::InvalidConfig(_))));
    }

    #[test]
    fn extension_filter_ignores_case() {
        assert!(is_supported_image(Path::new("a.PNG")));
        assert!(is_supported_image(Path::new("scan.Jpeg")));
        assert!(is_supported_image(Path::new("x.tiff")));
        assert!(!is_supported_image(Path::new("x.tif")));
        assert!(!is_supported_image(Path::new("notes.txt")));
        assert!(!is_supported_image(Path::new("png")));
    }
}
