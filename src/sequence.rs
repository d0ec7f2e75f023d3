//! The ordered list of loaded frames and the loaders that fill it.

use image::RgbImage;
use log::{debug, info, warn};
use rayon::prelude::*;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::composite::{composite, composite_rgb};
use crate::config::Resolution;
use crate::error::AnimResult;

/// File extensions accepted as animation frames.
pub const SUPPORTED_EXTENSIONS: [&str; 4] = ["jpg", "png", "bmp", "tif"];

pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_lowercase();
            SUPPORTED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Supported image files directly inside `dir`, sorted by path.
pub fn scan_directory(dir: &Path) -> AnimResult<Vec<PathBuf>> {
    let mut image_files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_supported_image(path))
        .collect();

    image_files.sort();
    Ok(image_files)
}

/// Keep supported files only, in path order.
fn filter_and_sort(files: &[PathBuf]) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = files
        .iter()
        .filter(|path| is_supported_image(path))
        .cloned()
        .collect();
    files.sort();
    files
}

/// One loaded image, already letterboxed to the sequence resolution.
#[derive(Debug, Clone)]
pub struct Frame {
    pub path: PathBuf,
    pub image: Arc<RgbImage>,
}

impl Frame {
    pub fn load(path: &Path, resolution: Resolution) -> AnimResult<Self> {
        let (width, height) = resolution.dimensions();
        let source = image::open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            image: Arc::new(composite(&source, width, height)),
        })
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn folder_name(&self) -> String {
        self.path
            .parent()
            .and_then(|dir| dir.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Frames in insertion order, all composited at one resolution.
#[derive(Debug, Clone, Default)]
pub struct ImageSequence {
    frames: Vec<Frame>,
    resolution: Resolution,
}

impl ImageSequence {
    pub fn new(resolution: Resolution) -> Self {
        Self {
            frames: Vec::new(),
            resolution,
        }
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frame(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    /// Decode and append every supported file, skipping unreadable ones.
    ///
    /// Returns the number of frames added.
    pub fn load_files(&mut self, files: &[PathBuf]) -> usize {
        let mut loader = SequenceLoader::new(files);
        while loader.step(self).is_some() {}
        loader.loaded()
    }

    /// Like [`load_files`](Self::load_files), decoding on the rayon pool.
    pub fn load_parallel(&mut self, files: &[PathBuf]) -> usize {
        let resolution = self.resolution;
        let loaded: Vec<Option<Frame>> = filter_and_sort(files)
            .par_iter()
            .map(|path| match Frame::load(path, resolution) {
                Ok(frame) => Some(frame),
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    None
                }
            })
            .collect();

        let before = self.frames.len();
        self.frames.extend(loaded.into_iter().flatten());
        self.frames.len() - before
    }

    /// Re-composite every frame from its source file at `resolution`.
    ///
    /// Frames whose source can no longer be read are rescaled from the
    /// composited copy instead.
    pub fn set_resolution(&mut self, resolution: Resolution) {
        if resolution == self.resolution {
            return;
        }
        info!(
            "Re-compositing {} frames from {} to {}",
            self.frames.len(),
            self.resolution,
            resolution
        );
        self.resolution = resolution;

        let (width, height) = resolution.dimensions();
        for frame in &mut self.frames {
            let image = match image::open(&frame.path) {
                Ok(source) => composite(&source, width, height),
                Err(e) => {
                    warn!("Could not reload {}: {}", frame.path.display(), e);
                    composite_rgb(&frame.image, width, height)
                }
            };
            frame.image = Arc::new(image);
        }
    }
}

/// Progress of an incremental load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadProgress {
    pub done: usize,
    pub total: usize,
}

/// Loads files one per [`step`](Self::step) so a UI can show progress
/// and stop between files.
#[derive(Debug)]
pub struct SequenceLoader {
    pending: VecDeque<PathBuf>,
    total: usize,
    done: usize,
    loaded: usize,
}

impl SequenceLoader {
    pub fn new(files: &[PathBuf]) -> Self {
        let pending: VecDeque<PathBuf> = filter_and_sort(files).into();
        debug!("Queued {} of {} selected files", pending.len(), files.len());
        Self {
            total: pending.len(),
            pending,
            done: 0,
            loaded: 0,
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn done(&self) -> usize {
        self.done
    }

    pub fn loaded(&self) -> usize {
        self.loaded
    }

    pub fn is_finished(&self) -> bool {
        self.pending.is_empty()
    }

    /// Load the next file into `sequence`. `None` once everything is done.
    pub fn step(&mut self, sequence: &mut ImageSequence) -> Option<LoadProgress> {
        let path = self.pending.pop_front()?;
        match Frame::load(&path, sequence.resolution()) {
            Ok(frame) => {
                sequence.push(frame);
                self.loaded += 1;
            }
            Err(e) => warn!("Skipping {}: {}", path.display(), e),
        }
        self.done += 1;
        Some(LoadProgress {
            done: self.done,
            total: self.total,
        })
    }

    /// Drop the remaining files; frames already loaded stay in the sequence.
    pub fn cancel(&mut self) {
        if !self.pending.is_empty() {
            info!(
                "Loading cancelled after {} of {} files",
                self.done, self.total
            );
        }
        self.pending.clear();
    }
}
