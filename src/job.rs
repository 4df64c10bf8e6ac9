//! Background job runner with a status event channel.
//!
//! A front end submits one [`Job`] at a time. The conversion runs on the
//! Tokio runtime while status flows back as [`JobEvent`]s over an unbounded
//! channel; the front end applies them on its own task, so no status state is
//! shared between threads. [`JobHandle::wait`] yields the final result.
//!
//! ```text
//! Idle ──submit──▶ Running ──▶ Succeeded
//!                          └─▶ Failed
//! ```
//!
//! A second submission while a job is running is rejected with
//! [`ConvertError::Busy`]. The guard is released when the job task ends,
//! whether it succeeded, failed or panicked.

use crate::config::ConversionConfig;
use crate::convert;
use crate::error::ConvertError;
use crate::output::JobOutput;
use crate::progress::{ConversionProgressCallback, ProgressCallback};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Status text shown while no job has been submitted.
pub const STATUS_READY: &str = "Ready";
/// Status text shown while a job is running.
pub const STATUS_PROCESSING: &str = "Processing, please wait...";
/// Status text after a pack job succeeded.
pub const STATUS_PACKED: &str = "Images converted to PDF";
/// Status text after a raster job succeeded.
pub const STATUS_RASTERISED: &str = "PDF converted to images";
/// Status text after any job failed.
pub const STATUS_FAILED: &str = "Conversion failed";

/// Result of one job.
pub type JobOutcome = Result<JobOutput, ConvertError>;

/// One unit of work for the runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    /// Pack a folder of images into a PDF.
    ///
    /// `output` defaults to `<folder>/<pdf_file_name>`.
    Pack {
        folder: PathBuf,
        output: Option<PathBuf>,
    },
    /// Render every page of a PDF to PNG files.
    ///
    /// `output_dir` defaults to `<parent>/<stem><image_dir_suffix>`.
    Raster {
        pdf: PathBuf,
        output_dir: Option<PathBuf>,
    },
}

impl Job {
    /// Status text reported when this job succeeds.
    pub fn success_text(&self) -> &'static str {
        match self {
            Job::Pack { .. } => STATUS_PACKED,
            Job::Raster { .. } => STATUS_RASTERISED,
        }
    }

    /// Where this job writes, with defaults resolved against `config`.
    pub fn destination(&self, config: &ConversionConfig) -> PathBuf {
        match self {
            Job::Pack { folder, output } => output
                .clone()
                .unwrap_or_else(|| config.default_pdf_path(folder)),
            Job::Raster { pdf, output_dir } => output_dir
                .clone()
                .unwrap_or_else(|| config.default_image_dir(pdf)),
        }
    }
}

/// Lifecycle of a job as seen by the front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobState {
    Idle,
    Running,
    Succeeded,
    Failed,
}

impl JobState {
    /// Generic status text; for [`JobState::Succeeded`] prefer
    /// [`Job::success_text`], which names the direction.
    pub fn status_text(self) -> &'static str {
        match self {
            JobState::Idle => STATUS_READY,
            JobState::Running => STATUS_PROCESSING,
            JobState::Succeeded => "Done",
            JobState::Failed => STATUS_FAILED,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Succeeded | JobState::Failed)
    }
}

/// Status update sent from the worker to the front end.
#[derive(Debug, Clone, PartialEq)]
pub enum JobEvent {
    /// The job moved to a new state. Always `Running` first.
    State {
        state: JobState,
        status: &'static str,
    },
    /// Number of images (pack) or pages (raster) to process.
    Total(usize),
    ItemStarted { index: usize, total: usize },
    ItemDone {
        index: usize,
        total: usize,
        path: PathBuf,
    },
    ItemFailed {
        index: usize,
        total: usize,
        error: String,
    },
    /// Sent once, after the conversion attempt completed. Nothing follows it.
    ///
    /// `message` is the output location on success and the user-facing error
    /// message on failure.
    Finished {
        state: JobState,
        status: &'static str,
        message: String,
    },
}

/// Runs conversions one at a time.
#[derive(Debug, Clone)]
pub struct JobRunner {
    config: ConversionConfig,
    busy: Arc<AtomicBool>,
}

impl JobRunner {
    /// Create a runner; `config` applies to every submitted job.
    ///
    /// Any progress callback on `config` is replaced by the job's event
    /// channel.
    pub fn new(config: ConversionConfig) -> Self {
        Self {
            config,
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Whether a job is currently in flight.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Start `job` on the current Tokio runtime.
    ///
    /// Returns [`ConvertError::Busy`] while another job submitted to this
    /// runner (or a clone of it) is still running.
    ///
    /// # Panics
    /// Must be called from within a Tokio runtime.
    pub fn submit(&self, job: Job) -> Result<JobHandle, ConvertError> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("Job rejected: another conversion is still running");
            return Err(ConvertError::Busy);
        }
        let guard = BusyGuard(Arc::clone(&self.busy));

        let (tx, rx) = mpsc::unbounded_channel();
        let mut config = self.config.clone();
        config.progress_callback = Some(Arc::new(ChannelProgress(tx.clone())) as ProgressCallback);

        let task = tokio::spawn(async move {
            let _ = tx.send(JobEvent::State {
                state: JobState::Running,
                status: STATUS_PROCESSING,
            });
            debug!("Job started: {:?}", job);

            let outcome = run(&job, &config).await;
            // The forwarding callback holds a sender; release it so the
            // receiver sees the channel close right after `Finished`.
            drop(config);

            let finished = match &outcome {
                Ok(out) => JobEvent::Finished {
                    state: JobState::Succeeded,
                    status: job.success_text(),
                    message: out.location().display().to_string(),
                },
                Err(e) => JobEvent::Finished {
                    state: JobState::Failed,
                    status: STATUS_FAILED,
                    message: e.user_message(),
                },
            };
            drop(guard);
            let _ = tx.send(finished);
            outcome
        });

        Ok(JobHandle { events: rx, task })
    }
}

async fn run(job: &Job, config: &ConversionConfig) -> JobOutcome {
    let dest = job.destination(config);
    match job {
        Job::Pack { folder, .. } => convert::images_to_pdf(folder, &dest, config)
            .await
            .map(JobOutput::Pack),
        Job::Raster { pdf, .. } => convert::pdf_to_images(pdf, &dest, config)
            .await
            .map(JobOutput::Raster),
    }
}

/// Receiving side of a submitted job.
#[derive(Debug)]
pub struct JobHandle {
    events: mpsc::UnboundedReceiver<JobEvent>,
    task: JoinHandle<JobOutcome>,
}

impl JobHandle {
    /// Next status event, or `None` once the job is over and every event
    /// has been received.
    pub async fn next_event(&mut self) -> Option<JobEvent> {
        self.events.recv().await
    }

    /// Wait for the job to end and return its result.
    ///
    /// Events not yet received are discarded.
    pub async fn wait(self) -> JobOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) => Err(ConvertError::Internal(format!("Job task failed: {}", e))),
        }
    }
}

/// Clears the busy flag when dropped, including during a panic unwind.
struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Forwards per-item callbacks into the job's event channel.
struct ChannelProgress(mpsc::UnboundedSender<JobEvent>);

impl ConversionProgressCallback for ChannelProgress {
    fn on_conversion_start(&self, total_items: usize) {
        let _ = self.0.send(JobEvent::Total(total_items));
    }

    fn on_item_start(&self, index: usize, total: usize) {
        let _ = self.0.send(JobEvent::ItemStarted { index, total });
    }

    fn on_item_complete(&self, index: usize, total: usize, path: &Path) {
        let _ = self.0.send(JobEvent::ItemDone {
            index,
            total,
            path: path.to_path_buf(),
        });
    }

    fn on_item_error(&self, index: usize, total: usize, error: &str) {
        let _ = self.0.send(JobEvent::ItemFailed {
            index,
            total,
            error: error.to_string(),
        });
    }
}
