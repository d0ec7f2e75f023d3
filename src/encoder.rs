//! Video encoder boundary. Frames go in as numbered PNGs, one file comes out.

use log::{debug, info};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::config::FrameRate;
use crate::error::{AnimError, AnimResult};

/// Default x264 constant rate factor.
pub const DEFAULT_CRF: u32 = 20;

/// Digits used to number frames, never fewer than four.
pub fn frame_padding(total_frames: usize) -> usize {
    let digits = if total_frames == 0 {
        1
    } else {
        total_frames.ilog10() as usize + 1
    };
    digits.max(4)
}

/// An ordered run of numbered frame files in one directory.
#[derive(Debug, Clone)]
pub struct FrameSet {
    dir: PathBuf,
    padding: usize,
    count: usize,
}

impl FrameSet {
    pub fn new(dir: impl Into<PathBuf>, expected_frames: usize) -> Self {
        Self {
            dir: dir.into(),
            padding: frame_padding(expected_frames),
            count: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Path of the `index`th frame (0-based; files are numbered from 1).
    pub fn frame_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!(
            "frame_{:0width$}.png",
            index + 1,
            width = self.padding
        ))
    }

    /// Reserve the next frame slot and return where to write it.
    pub fn next_path(&mut self) -> PathBuf {
        let path = self.frame_path(self.count);
        self.count += 1;
        path
    }

    pub fn paths(&self) -> impl Iterator<Item = PathBuf> + '_ {
        (0..self.count).map(|i| self.frame_path(i))
    }

    /// printf-style input pattern understood by ffmpeg's image2 demuxer.
    pub fn pattern(&self) -> PathBuf {
        self.dir.join(format!("frame_%0{}d.png", self.padding))
    }
}

/// Something that turns a frame set into a video file.
pub trait VideoEncoder {
    fn encode(&self, frames: &FrameSet, fps: FrameRate, output: &Path) -> AnimResult<()>;

    fn name(&self) -> &str;
}

/// H.264/MP4 through the `ffmpeg` executable.
#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    program: PathBuf,
    crf: u32,
}

impl Default for FfmpegEncoder {
    fn default() -> Self {
        Self {
            program: PathBuf::from("ffmpeg"),
            crf: DEFAULT_CRF,
        }
    }
}

impl FfmpegEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_crf(mut self, crf: u32) -> AnimResult<Self> {
        if crf > 51 {
            return Err(AnimError::invalid_setting(
                "Quality (CRF) must be between 0 and 51",
            ));
        }
        self.crf = crf;
        Ok(self)
    }

    pub fn crf(&self) -> u32 {
        self.crf
    }

    /// Fail early with [`AnimError::EncoderUnavailable`] when the program cannot run.
    pub fn ensure_available(&self) -> AnimResult<()> {
        if self.is_available() {
            Ok(())
        } else {
            Err(AnimError::EncoderUnavailable {
                message: format!("{} was not found", self.program.display()),
            })
        }
    }

    pub fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    fn command(&self, frames: &FrameSet, fps: FrameRate, output: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-y")
            .arg("-loglevel")
            .arg("error")
            .arg("-framerate")
            .arg(fps.as_u32().to_string())
            .arg("-i")
            .arg(frames.pattern())
            .arg("-c:v")
            .arg("libx264")
            .arg("-crf")
            .arg(self.crf.to_string())
            .arg("-pix_fmt")
            .arg("yuv420p")
            .arg(output);
        cmd
    }
}

impl VideoEncoder for FfmpegEncoder {
    fn encode(&self, frames: &FrameSet, fps: FrameRate, output: &Path) -> AnimResult<()> {
        if frames.is_empty() {
            return Err(AnimError::EmptySequence);
        }

        let mut cmd = self.command(frames, fps, output);
        debug!("Running {:?}", cmd);

        let result = cmd.output().map_err(|e| AnimError::EncoderUnavailable {
            message: format!("failed to run {}: {}", self.program.display(), e),
        })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(AnimError::encoder(format!(
                "ffmpeg exited with {}: {}",
                result.status,
                stderr.trim()
            )));
        }

        info!(
            "Encoded {} frames at {} fps into {}",
            frames.len(),
            fps,
            output.display()
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}
