//! # pdfimg
//!
//! Two conversions between image files and PDF documents:
//!
//! * **pack**: every image in a folder becomes one page of a new PDF, in
//!   natural file-name order (`img2.png` before `img10.png`).
//! * **raster**: every page of a PDF becomes a `page_NNN.png` file, rendered
//!   at a configurable zoom (200 % by default).
//!
//! ## Pipeline Overview
//!
//! ```text
//! folder ─ collect ─ pack (lopdf) ─────────▶ output_images.pdf
//! PDF ──── input ─── raster (pdfium) ──────▶ <stem>_images/page_001.png …
//! ```
//!
//! Packing is pure Rust. Rasterising needs a pdfium shared library, found
//! through `PDFIUM_LIB_PATH`, next to the executable, in the user data
//! directory or on the system library path.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdfimg::{images_to_pdf, pdf_to_images, ConversionConfig};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::default();
//!
//!     let folder = Path::new("scans");
//!     let pdf = images_to_pdf(folder, config.default_pdf_path(folder), &config).await?;
//!     println!("{} pages → {}", pdf.page_count, pdf.output_path.display());
//!
//!     let dir = config.default_image_dir(&pdf.output_path);
//!     let pages = pdf_to_images(&pdf.output_path, &dir, &config).await?;
//!     println!("{} PNG files in {}", pages.pages.len(), pages.output_dir.display());
//!     Ok(())
//! }
//! ```
//!
//! Front ends that want one-job-at-a-time semantics and a status feed use
//! [`JobRunner`] instead of calling the functions directly.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfimg` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdfimg = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod job;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder};
pub use convert::{images_to_pdf, images_to_pdf_sync, pdf_to_images, pdf_to_images_sync};
pub use error::{ConvertError, ErrorKind};
pub use job::{Job, JobEvent, JobHandle, JobOutcome, JobRunner, JobState};
pub use output::{JobOutput, PackOutput, RasterOutput};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
