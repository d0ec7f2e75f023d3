//! Export of a loaded sequence to a video file.
//!
//! An export runs in two stages. Every source frame is composited at the
//! export resolution and written to a scratch directory once per held tick,
//! then the encoder turns the numbered frames into the output file. The
//! session advances one source frame per [`ExportSession::step`] call so the
//! caller can show progress and honour cancellation between frames.

use image::{ImageFormat, RgbImage};
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::composite::composite_rgb;
use crate::config::{Direction, ExportSettings, FrameHold};
use crate::encoder::{FrameSet, VideoEncoder};
use crate::error::{AnimError, AnimResult};
use crate::sequence::ImageSequence;

/// Source index of every output frame, in output order.
pub fn frame_order(len: usize, direction: Direction, frame_hold: FrameHold) -> Vec<usize> {
    let sources: Box<dyn Iterator<Item = usize>> = match direction {
        Direction::Forward => Box::new(0..len),
        Direction::Reverse => Box::new((0..len).rev()),
    };
    sources
        .flat_map(|index| std::iter::repeat(index).take(frame_hold.as_usize()))
        .collect()
}

/// Append `.mp4` unless the path already carries it.
pub fn ensure_mp4_extension(path: &Path) -> PathBuf {
    let has_mp4 = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("mp4"))
        .unwrap_or(false);

    if has_mp4 {
        path.to_path_buf()
    } else {
        let mut name = path.as_os_str().to_os_string();
        name.push(".mp4");
        PathBuf::from(name)
    }
}

static SCRATCH_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Temporary directory removed when dropped.
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    pub fn new(prefix: &str) -> AnimResult<Self> {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.subsec_nanos())
            .unwrap_or(0);
        let path = std::env::temp_dir().join(format!(
            "{}_{}_{}_{}",
            prefix,
            std::process::id(),
            nanos,
            SCRATCH_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        fs::create_dir_all(&path)?;
        debug!("Created scratch directory {}", path.display());
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_dir_all(&self.path) {
            warn!(
                "Failed to remove scratch directory {}: {}",
                self.path.display(),
                e
            );
        }
    }
}

/// Where an export currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStage {
    Rendering,
    Encoding,
    Complete,
    Cancelled,
    Failed,
}

/// Outcome of one [`ExportSession::step`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportStep {
    /// `done` of `total` source frames are on disk.
    Progress { done: usize, total: usize },
    /// The video was written to this path.
    Finished(PathBuf),
}

/// One export in flight.
#[derive(Debug)]
pub struct ExportSession {
    settings: ExportSettings,
    output: PathBuf,
    sources: Vec<Arc<RgbImage>>,
    order: Vec<usize>,
    next: usize,
    frames: FrameSet,
    scratch: Option<ScratchDir>,
    stage: ExportStage,
}

impl ExportSession {
    /// Snapshot `sequence`, plan the output order and prepare a scratch directory.
    pub fn new(
        sequence: &ImageSequence,
        settings: ExportSettings,
        output: &Path,
    ) -> AnimResult<Self> {
        if sequence.is_empty() {
            return Err(AnimError::EmptySequence);
        }

        let sources: Vec<Arc<RgbImage>> = sequence
            .frames()
            .iter()
            .map(|frame| Arc::clone(&frame.image))
            .collect();
        let order = frame_order(sources.len(), settings.direction, settings.frame_hold);

        let output = ensure_mp4_extension(output);
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let scratch = ScratchDir::new("animpal_export")?;
        let frames = FrameSet::new(scratch.path(), order.len());

        info!(
            "Exporting {} frames ({} output frames) at {} {} fps to {}",
            sources.len(),
            order.len(),
            settings.resolution,
            settings.fps,
            output.display()
        );

        Ok(Self {
            settings,
            output,
            sources,
            order,
            next: 0,
            frames,
            scratch: Some(scratch),
            stage: ExportStage::Rendering,
        })
    }

    pub fn stage(&self) -> ExportStage {
        self.stage
    }

    pub fn total(&self) -> usize {
        self.sources.len()
    }

    pub fn done(&self) -> usize {
        self.next
    }

    /// The next step hands the rendered frames to the encoder.
    pub fn is_encoding_next(&self) -> bool {
        self.stage == ExportStage::Rendering && self.next == self.sources.len()
    }

    /// Source index of every output frame, in the order they are written.
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    pub fn scratch_path(&self) -> Option<&Path> {
        self.scratch.as_ref().map(|s| s.path())
    }

    /// Render one source frame, or encode once all are rendered.
    pub fn step(&mut self, encoder: &dyn VideoEncoder) -> AnimResult<ExportStep> {
        match self.stage {
            ExportStage::Rendering => {}
            ExportStage::Complete => return Ok(ExportStep::Finished(self.output.clone())),
            ExportStage::Cancelled => return Err(AnimError::Cancelled),
            ExportStage::Encoding | ExportStage::Failed => {
                return Err(AnimError::encoder("export is no longer running"))
            }
        }

        let result = if self.next < self.sources.len() {
            self.render_next()
        } else {
            self.encode(encoder)
        };

        if let Err(e) = &result {
            warn!("Export failed: {}", e);
            self.stage = ExportStage::Failed;
            self.scratch = None;
        }
        result
    }

    fn render_next(&mut self) -> AnimResult<ExportStep> {
        let hold = self.settings.frame_hold.as_usize();
        let run = &self.order[self.next * hold..(self.next + 1) * hold];
        let (width, height) = self.settings.resolution.dimensions();
        let scaled = composite_rgb(&self.sources[run[0]], width, height);

        let first = self.frames.next_path();
        scaled.save_with_format(&first, ImageFormat::Png)?;
        for _ in 1..run.len() {
            fs::copy(&first, self.frames.next_path())?;
        }

        self.next += 1;
        Ok(ExportStep::Progress {
            done: self.next,
            total: self.sources.len(),
        })
    }

    fn encode(&mut self, encoder: &dyn VideoEncoder) -> AnimResult<ExportStep> {
        self.stage = ExportStage::Encoding;
        info!(
            "Encoding {} frames with {}",
            self.frames.len(),
            encoder.name()
        );
        encoder.encode(&self.frames, self.settings.fps, &self.output)?;

        self.stage = ExportStage::Complete;
        self.scratch = None;
        Ok(ExportStep::Finished(self.output.clone()))
    }

    /// Abandon the export. Rendered frames are discarded and no video is written.
    pub fn cancel(&mut self) {
        if self.stage == ExportStage::Rendering {
            info!("Export cancelled after {} of {} frames", self.next, self.sources.len());
            self.stage = ExportStage::Cancelled;
            self.scratch = None;
        }
    }
}

/// Receives progress from [`run_export`] and decides whether to continue.
pub trait ExportObserver {
    fn is_cancelled(&self) -> bool {
        false
    }

    fn on_progress(&mut self, _done: usize, _total: usize) {}

    fn on_encoding(&mut self) {}
}

/// Drive `session` to completion, checking for cancellation between frames.
pub fn run_export(
    mut session: ExportSession,
    encoder: &dyn VideoEncoder,
    observer: &mut dyn ExportObserver,
) -> AnimResult<PathBuf> {
    loop {
        if observer.is_cancelled() {
            session.cancel();
            return Err(AnimError::Cancelled);
        }
        if session.is_encoding_next() {
            observer.on_encoding();
        }
        match session.step(encoder)? {
            ExportStep::Progress { done, total } => observer.on_progress(done, total),
            ExportStep::Finished(path) => return Ok(path),
        }
    }
}
