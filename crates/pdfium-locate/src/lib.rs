//! # pdfium-locate
//!
//! Find an installed [PDFium](https://pdfium.googlesource.com/pdfium/) shared
//! library and bind [`pdfium_render`] to it.
//!
//! `pdfium-render` needs the native library at runtime. This crate never
//! downloads anything; it only looks in a fixed list of places and reports a
//! precise error listing every location it tried.
//!
//! ## Search order
//!
//! 1. `PDFIUM_LIB_PATH` — explicit path to the library file.
//! 2. The directory containing the running executable.
//! 3. The per-user data directory, e.g. `~/.local/share/pdfimg/` on Linux.
//! 4. The system library search path (`LD_LIBRARY_PATH`, `/usr/lib`, …).
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pdfium_locate::bind_pdfium;
//!
//! let pdfium = bind_pdfium().expect("PDFium unavailable");
//! let doc = pdfium.load_pdf_from_file("in.pdf", None).unwrap();
//! println!("{} pages", doc.pages().len());
//! ```

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use pdfium_render::prelude::Pdfium;
use thiserror::Error;

/// Environment variable holding an explicit library path.
pub const ENV_LIB_PATH: &str = "PDFIUM_LIB_PATH";

/// Sub-directory of the per-user data directory searched for the library.
pub const DATA_DIR_NAME: &str = "pdfimg";

/// Errors returned by pdfium-locate operations.
#[derive(Error, Debug)]
pub enum LocateError {
    /// No candidate location held a loadable library.
    #[error(
        "PDFium library not found. Searched:\n{}\n\
         Set {}=/path/to/{} or install pdfium system-wide.",
        format_searched(.searched),
        ENV_LIB_PATH,
        platform_library_name()
    )]
    NotFound { searched: Vec<PathBuf> },

    /// A library file exists but `libloading` / `pdfium-render` rejected it.
    #[error("Failed to bind PDFium from '{path}': {reason}")]
    Bind { path: PathBuf, reason: String },
}

fn format_searched(paths: &[PathBuf]) -> String {
    let mut out = String::new();
    for p in paths {
        out.push_str("  • ");
        out.push_str(&p.display().to_string());
        out.push('\n');
    }
    out.push_str("  • <system library path>");
    out
}

/// Platform file name of the library (`libpdfium.so`, `libpdfium.dylib`, `pdfium.dll`).
pub fn platform_library_name() -> String {
    Pdfium::pdfium_platform_library_name()
        .to_string_lossy()
        .into_owned()
}

/// The per-user directory searched in step 3, if the platform has one.
pub fn user_library_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join(DATA_DIR_NAME))
}

/// All file-system locations searched before falling back to the system
/// library path, in priority order. Locations need not exist.
pub fn candidate_paths() -> Vec<PathBuf> {
    let mut out = Vec::with_capacity(3);

    if let Ok(p) = std::env::var(ENV_LIB_PATH) {
        if !p.is_empty() {
            out.push(PathBuf::from(p));
        }
    }

    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        out.push(Pdfium::pdfium_platform_library_name_at_path(&exe_dir));
    }

    if let Some(dir) = user_library_dir() {
        out.push(Pdfium::pdfium_platform_library_name_at_path(&dir));
    }

    out
}

static RESOLVED_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Returns the first candidate path that exists on disk, if any.
///
/// The result is remembered for the rest of the process once found.
pub fn locate_pdfium_library() -> Option<PathBuf> {
    if let Some(path) = RESOLVED_PATH.get() {
        return Some(path.clone());
    }

    let found = candidate_paths().into_iter().find(|p| p.is_file())?;
    let _ = RESOLVED_PATH.set(found.clone());
    Some(found)
}

/// Binds to PDFium using the search order described in the crate docs.
pub fn bind_pdfium() -> Result<Pdfium, LocateError> {
    if let Some(path) = locate_pdfium_library() {
        return bind_pdfium_from_path(&path);
    }

    Pdfium::bind_to_system_library()
        .map(Pdfium::new)
        .map_err(|_| LocateError::NotFound {
            searched: candidate_paths(),
        })
}

/// Binds to a PDFium library at an explicit `path`.
pub fn bind_pdfium_from_path(path: &Path) -> Result<Pdfium, LocateError> {
    Pdfium::bind_to_library(path)
        .map(Pdfium::new)
        .map_err(|e| LocateError::Bind {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}
