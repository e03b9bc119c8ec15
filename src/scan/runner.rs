//! Scan entry point: spawns the worker thread and reports through the event callback.
//!
//! Only one scan runs at a time per `Scanner`. The worker owns the surface for
//! the whole scan; the caller only sees events and the `ScanHandle`.

use image::RgbaImage;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use tracing::{error, info, warn};

use super::events::ScanEvent;
use super::filter::ScanFilter;
use super::machine::ScanMachine;
use super::matching::crop;
use super::session::ScanSession;
use crate::artifact::FieldMapper;
use crate::calibration::{CalibratedLayout, LayoutRepository};
use crate::capture::SurfaceConnector;
use crate::config::{MatchThresholds, ScanTiming};
use crate::error::{Result, ScanError};
use crate::export::{ExportFormat, SchemaVocabulary, encode};
use crate::ocr::Recognize;

/// Everything a scan reads besides the surface.
pub struct ScanContext {
    pub recognizer: Box<dyn Recognize + Send>,
    pub mapper: FieldMapper,
    pub layouts: LayoutRepository,
    pub timing: ScanTiming,
    pub thresholds: MatchThresholds,
    /// Directory holding export vocabulary overrides.
    pub mapper_dir: Option<PathBuf>,
}

/// Cooperative cancellation flag, checked before every state transition.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Parameters of one scan. Bounds are validated when the scan starts.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScanRequest {
    pub min_star: i32,
    pub max_star: i32,
    pub min_level: i32,
    pub max_level: i32,
    pub format: ExportFormat,
}

impl Default for ScanRequest {
    fn default() -> Self {
        Self {
            min_star: 4,
            max_star: 5,
            min_level: 0,
            max_level: 20,
            format: ExportFormat::default(),
        }
    }
}

/// Clears the running flag when the worker exits, including by panic.
struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct Scanner {
    context: Arc<Mutex<ScanContext>>,
    connector: Arc<dyn SurfaceConnector>,
    running: Arc<AtomicBool>,
}

impl Scanner {
    pub fn new(context: ScanContext, connector: Box<dyn SurfaceConnector>) -> Self {
        Self {
            context: Arc::new(Mutex::new(context)),
            connector: Arc::from(connector),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Starts a scan on a worker thread and returns immediately.
    ///
    /// Invalid bounds are reported through `on_event` before this returns and
    /// nothing touches the surface. Every started scan ends with exactly one
    /// terminal event.
    pub fn scan<F>(&self, request: ScanRequest, mut on_event: F) -> Result<ScanHandle>
    where
        F: FnMut(ScanEvent) + Send + 'static,
    {
        let filter = match ScanFilter::new(
            request.min_star,
            request.max_star,
            request.min_level,
            request.max_level,
        ) {
            Ok(filter) => filter,
            Err(e) => {
                warn!("Rejected scan request: {}", e);
                on_event(ScanEvent::InvalidParameters);
                return Err(e);
            }
        };

        if self.running.swap(true, Ordering::SeqCst) {
            return Err(ScanError::AlreadyRunning);
        }
        let guard = RunningGuard(Arc::clone(&self.running));

        let cancel = CancelToken::new();
        let worker_cancel = cancel.clone();
        let context = Arc::clone(&self.context);
        let connector = Arc::clone(&self.connector);

        info!(
            "Starting scan: star {}..={}, level {}..={}, format {:?}",
            filter.min_star, filter.max_star, filter.min_level, filter.max_level, request.format
        );

        let thread = thread::Builder::new()
            .name("scan-worker".to_string())
            .spawn(move || {
                let _guard = guard;
                run_worker(
                    &context,
                    connector.as_ref(),
                    filter,
                    request.format,
                    worker_cancel,
                    &mut on_event,
                )
            })?;

        Ok(ScanHandle { cancel, thread })
    }
}

/// Handle to a running scan.
pub struct ScanHandle {
    cancel: CancelToken,
    thread: JoinHandle<Result<()>>,
}

impl ScanHandle {
    /// Asks the worker to stop; it finishes with `InterruptedByUser`.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Waits for the worker. The error is the fatal one already reported as an event.
    pub fn join(self) -> Result<()> {
        self.thread.join().map_err(|_| ScanError::WorkerPanicked)?
    }
}

fn run_worker(
    context: &Mutex<ScanContext>,
    connector: &dyn SurfaceConnector,
    filter: ScanFilter,
    format: ExportFormat,
    cancel: CancelToken,
    on_event: &mut dyn FnMut(ScanEvent),
) -> Result<()> {
    match scan_inventory(context, connector, filter, format, cancel, on_event) {
        Ok(terminal) => {
            on_event(terminal);
            Ok(())
        }
        Err(e) => {
            error!("Scan failed: {}", e);
            on_event(e.as_event().unwrap_or(ScanEvent::SwitchSurfaceFailed));
            Err(e)
        }
    }
}

/// Runs the whole scan and returns its terminal event.
fn scan_inventory(
    context: &Mutex<ScanContext>,
    connector: &dyn SurfaceConnector,
    filter: ScanFilter,
    format: ExportFormat,
    cancel: CancelToken,
    on_event: &mut dyn FnMut(ScanEvent),
) -> Result<ScanEvent> {
    let mut guard = context.lock().map_err(|_| ScanError::WorkerPanicked)?;
    let ctx: &mut ScanContext = &mut guard;

    let mut surface = connector.connect().map_err(ScanError::SwitchSurfaceFailed)?;
    let (width, height) = surface
        .client_size()
        .map_err(ScanError::SwitchSurfaceFailed)?;
    let layout = ctx.layouts.calibrate(width, height)?;

    let frame = surface.capture().map_err(ScanError::SwitchSurfaceFailed)?;
    let count = read_artifact_count(ctx, &frame, &layout)?;
    info!("Inventory holds {} artifacts", count);
    on_event(ScanEvent::ArtifactCount { count });

    let anchor = crop(&frame, &layout.grid.anchor_strip());
    let session = ScanSession::new(filter, anchor, count);

    let mut machine = ScanMachine::new(
        &mut *ctx,
        surface.as_mut(),
        layout,
        session,
        cancel,
        on_event,
    );
    machine.run()?;
    let outcome = machine.into_outcome();

    let vocabulary = match SchemaVocabulary::load(format, ctx.mapper_dir.as_deref()) {
        Ok(vocabulary) => vocabulary,
        Err(e) => {
            warn!("Falling back to the builtin {:?} vocabulary: {:#}", format, e);
            SchemaVocabulary::builtin(format)
        }
    };
    let records = encode(&outcome.records, format, &vocabulary);
    info!(
        "Encoded {} of {} records as {:?}",
        records.len(),
        outcome.records.len(),
        format
    );

    Ok(if outcome.interrupted {
        ScanEvent::InterruptedByUser { records }
    } else {
        ScanEvent::Finished { records }
    })
}

fn read_artifact_count(
    ctx: &mut ScanContext,
    frame: &RgbaImage,
    layout: &CalibratedLayout,
) -> Result<u32> {
    let text = match ctx.recognizer.recognize(frame, &[layout.count]) {
        Ok(lines) => lines.into_iter().next().map(|line| line.text).unwrap_or_default(),
        Err(e) => {
            warn!("Count recognition failed: {:#}", e);
            String::new()
        }
    };
    ctx.mapper
        .numbers()
        .parse_int(&text)
        .ok_or(ScanError::ArtifactCountUnreadable { text })
}
