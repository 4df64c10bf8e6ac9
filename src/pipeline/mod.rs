//! Pipeline stages for image/PDF conversion.
//!
//! Each submodule implements exactly one step, so each is testable on its
//! own and the PDF backend behind one direction can change without touching
//! the other.
//!
//! ## Data Flow
//!
//! ```text
//! images → PDF:  collect ──▶ pack
//!                (natural)   (lopdf)
//!
//! PDF → images:  input ──▶ raster
//!                (%PDF)    (pdfium)
//! ```
//!
//! 1. [`collect`] — list supported images in a folder, naturally sorted
//! 2. [`natural`] — the ordering used by `collect`
//! 3. [`pack`]    — embed each image as one page and write the PDF atomically;
//!    `header` supplies JPEG frame info and declared pixel density
//! 4. [`input`]   — reject missing or non-PDF sources before any output exists
//! 5. [`raster`]  — render each page to `page_NNN.png`; runs in
//!    `spawn_blocking` because pdfium is not async-safe

pub mod collect;
pub(crate) mod header;
pub mod input;
pub mod natural;
pub mod pack;
pub mod raster;
