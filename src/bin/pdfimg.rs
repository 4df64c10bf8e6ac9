//! CLI binary for pdfimg.
//!
//! A thin shim over the library crate: maps flags to `ConversionConfig`,
//! submits one job to the `JobRunner` and renders its status events.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use pdfimg::job::STATUS_READY;
use pdfimg::{ConversionConfig, Job, JobEvent, JobOutput, JobRunner, JobState};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

const AFTER_HELP: &str = r#"EXAMPLES:
  # Pack every image in a folder into <folder>/output_images.pdf
  pdfimg pack ./scans

  # Pack into a chosen file, every page sized at 300 DPI
  pdfimg pack ./scans -o scans.pdf --dpi 300

  # Render every page of a PDF to report_images/page_001.png …
  pdfimg raster report.pdf

  # Render at 300 % into a chosen directory, JSON summary on stdout
  pdfimg --json raster report.pdf -o pages --zoom 300

SUPPORTED IMAGES:
  png, jpg, jpeg, bmp, tiff, gif (case-insensitive, first frame only)

ENVIRONMENT VARIABLES:
  PDFIMG_ZOOM         Default for --zoom
  PDFIMG_DPI          Default for --dpi
  PDFIMG_VERBOSE      Same as --verbose
  PDFIMG_QUIET        Same as --quiet
  PDFIMG_NO_PROGRESS  Same as --no-progress
  PDFIMG_JSON         Same as --json
  PDFIUM_LIB_PATH     Path to libpdfium (file or directory); needed for `raster`
                      unless pdfium sits next to the binary, in the user data
                      directory, or on the system library path
  RUST_LOG            Log filter, overrides --verbose/--quiet
"#;

/// Pack images into a PDF, or render PDF pages to PNG files.
#[derive(Parser, Debug)]
#[command(
    name = "pdfimg",
    version,
    about = "Pack a folder of images into one PDF, or render PDF pages to PNG files",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Print the result as JSON on stdout.
    #[arg(long, global = true, env = "PDFIMG_JSON")]
    json: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "PDFIMG_QUIET")]
    quiet: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PDFIMG_VERBOSE")]
    verbose: bool,

    /// Disable progress bar.
    #[arg(long, global = true, env = "PDFIMG_NO_PROGRESS")]
    no_progress: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Pack every supported image in FOLDER into one PDF (one page per image).
    Pack {
        /// Folder holding the images; subfolders are ignored.
        folder: PathBuf,

        /// PDF to write. Default: <FOLDER>/output_images.pdf.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Pixel density used to size every page; 72 makes one pixel one point.
        /// Default: the density each image declares, else 72.
        #[arg(long, env = "PDFIMG_DPI")]
        dpi: Option<f32>,
    },
    /// Render every page of PDF to page_NNN.png files.
    Raster {
        /// PDF file to render.
        pdf: PathBuf,

        /// Directory for the PNG files. Default: <PDF dir>/<stem>_images.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Zoom in percent (10–1000); 200 renders at twice the page size.
        #[arg(long, env = "PDFIMG_ZOOM", default_value_t = 200,
              value_parser = clap::value_parser!(u32).range(10..=1000))]
        zoom: u32,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config and job ─────────────────────────────────────────────
    let (config, job) = build_job(&cli.command)?;
    let runner = JobRunner::new(config);

    // ── Run, applying status events on this task ─────────────────────────
    let mut handle = runner.submit(job).context("Failed to start conversion")?;
    let bar = show_progress.then(new_spinner);

    while let Some(event) = handle.next_event().await {
        if let Some(ref bar) = bar {
            render_event(bar, &event);
        }
    }

    let outcome = handle.wait().await;

    // ── Report ───────────────────────────────────────────────────────────
    match outcome {
        Ok(output) => {
            if cli.json {
                let json = serde_json::to_string_pretty(&output)
                    .context("Failed to serialise output")?;
                println!("{json}");
            } else if !cli.quiet {
                print_success(&output);
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("{} {}", red("✘"), bold(JobState::Failed.status_text()));
            eprintln!("  {}: {}", e.kind().status_text(), e.user_message());
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Map the subcommand to a `ConversionConfig` and a `Job`.
fn build_job(command: &Command) -> Result<(ConversionConfig, Job)> {
    match command {
        Command::Pack {
            folder,
            output,
            dpi,
        } => {
            let mut builder = ConversionConfig::builder();
            if let Some(dpi) = dpi {
                builder = builder.image_dpi(*dpi);
            }
            let config = builder.build().context("Invalid configuration")?;
            let job = Job::Pack {
                folder: folder.clone(),
                output: output.clone(),
            };
            Ok((config, job))
        }
        Command::Raster { pdf, output, zoom } => {
            let config = ConversionConfig::builder()
                .zoom(*zoom)
                .build()
                .context("Invalid configuration")?;
            let job = Job::Raster {
                pdf: pdf.clone(),
                output_dir: output.clone(),
            };
            Ok((config, job))
        }
    }
}

/// Spinner shown until the item count is known.
fn new_spinner() -> ProgressBar {
    let bar = ProgressBar::new(0);
    let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(TICKS);
    bar.set_style(spinner_style);
    bar.set_prefix("pdfimg");
    bar.set_message(STATUS_READY);
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

/// Switch to the full progress-bar style once we know `total`.
fn activate_bar(bar: &ProgressBar, total: usize) {
    let progress_style = ProgressStyle::with_template(
        "{spinner:.cyan} {prefix:.bold}  \
         [{bar:42.green/238}] {pos:>3}/{len}  \
         ⏱ {elapsed_precise}  ETA {eta_precise}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("█▉▊▋▌▍▎▏  ")
    .tick_strings(TICKS);

    bar.set_length(total as u64);
    bar.set_style(progress_style);
    bar.set_prefix("Converting");
    bar.reset_eta();
}

fn render_event(bar: &ProgressBar, event: &JobEvent) {
    match event {
        JobEvent::State { status, .. } => bar.set_message(*status),
        JobEvent::Total(total) => {
            activate_bar(bar, *total);
            bar.println(format!(
                "{} {}",
                cyan("◆"),
                bold(&format!("Processing {total} items…"))
            ));
        }
        JobEvent::ItemStarted { index, .. } => bar.set_message(format!("item {index}")),
        JobEvent::ItemDone { index, total, path } => {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            bar.println(format!(
                "  {} {:>3}/{:<3}  {}",
                green("✓"),
                index,
                total,
                dim(&name)
            ));
            bar.inc(1);
        }
        JobEvent::ItemFailed {
            index,
            total,
            error,
        } => {
            // Truncate very long error messages to keep output tidy.
            let msg = match error.char_indices().nth(79) {
                Some((cut, _)) => format!("{}\u{2026}", &error[..cut]),
                None => error.clone(),
            };
            bar.println(format!(
                "  {} {:>3}/{:<3}  {}",
                red("✗"),
                index,
                total,
                red(&msg)
            ));
        }
        JobEvent::Finished { .. } => bar.finish_and_clear(),
    }
}

fn print_success(output: &JobOutput) {
    let (status, ms) = match output {
        JobOutput::Pack(p) => (pdfimg::job::STATUS_PACKED, p.duration_ms),
        JobOutput::Raster(r) => (pdfimg::job::STATUS_RASTERISED, r.duration_ms),
    };
    eprintln!(
        "{} {}  {} pages  {}ms",
        green("✔"),
        bold(status),
        output.page_count(),
        ms
    );
    println!("{}", output.location().display());
}
