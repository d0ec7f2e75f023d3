use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use animpal::encoder::{FrameSet, VideoEncoder};
use animpal::export::{run_export, ExportObserver, ExportSession, ExportStage, ExportStep};
use animpal::sequence::ImageSequence;
use animpal::{AnimError, AnimResult, Direction, ExportSettings, FrameHold, FrameRate, Resolution};
use image::{Rgb, RgbImage};

/// Encoder stand-in: records the centre pixel of every frame and writes a stub output.
#[derive(Default)]
struct RecordingEncoder {
    frames: RefCell<Vec<u8>>,
    fps: RefCell<Option<FrameRate>>,
    fail: bool,
}

impl VideoEncoder for RecordingEncoder {
    fn encode(&self, frames: &FrameSet, fps: FrameRate, output: &Path) -> AnimResult<()> {
        if self.fail {
            return Err(AnimError::encoder("simulated failure"));
        }
        for path in frames.paths() {
            let frame = image::open(&path)?.to_rgb8();
            let (w, h) = frame.dimensions();
            self.frames.borrow_mut().push(frame.get_pixel(w / 2, h / 2).0[0]);
        }
        *self.fps.borrow_mut() = Some(fps);
        fs::write(output, b"mp4")?;
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

struct CancelAfter {
    frames: usize,
    seen: usize,
    encoding: bool,
}

impl ExportObserver for CancelAfter {
    fn is_cancelled(&self) -> bool {
        self.seen >= self.frames
    }

    fn on_progress(&mut self, done: usize, _total: usize) {
        self.seen = done;
    }

    fn on_encoding(&mut self) {
        self.encoding = true;
    }
}

fn test_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("animpal_it_{}_{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

/// Sequence of `count` frames whose red channel encodes their position (10, 20, 30...).
///
/// Sources are already 720p so compositing copies pixels without resampling.
fn numbered_sequence(dir: &Path, count: u8) -> ImageSequence {
    let files: Vec<PathBuf> = (0..count)
        .map(|i| {
            let path = dir.join(format!("shot_{:02}.png", i));
            RgbImage::from_pixel(1280, 720, Rgb([(i + 1) * 10, 0, 0]))
                .save(&path)
                .unwrap();
            path
        })
        .collect();

    let mut sequence = ImageSequence::new(Resolution::Hd720);
    assert_eq!(sequence.load_files(&files), count as usize);
    sequence
}

fn settings(direction: Direction, hold: u8) -> ExportSettings {
    ExportSettings {
        resolution: Resolution::Hd720,
        fps: FrameRate::Fps18,
        direction,
        frame_hold: FrameHold::new(hold).unwrap(),
    }
}

fn export(
    sequence: &ImageSequence,
    settings: ExportSettings,
    output: &Path,
) -> (AnimResult<PathBuf>, Vec<u8>) {
    let encoder = RecordingEncoder::default();
    let session = ExportSession::new(sequence, settings, output).unwrap();
    let mut observer = CancelAfter {
        frames: usize::MAX,
        seen: 0,
        encoding: false,
    };
    let result = run_export(session, &encoder, &mut observer);
    let frames = encoder.frames.into_inner();
    (result, frames)
}

#[test]
fn test_forward_export_holds_each_frame() {
    let dir = test_dir("forward");
    let sequence = numbered_sequence(&dir, 3);

    let (result, frames) = export(&sequence, settings(Direction::Forward, 2), &dir.join("out"));
    let path = result.unwrap();

    assert_eq!(path, dir.join("out.mp4"));
    assert!(path.exists());
    assert_eq!(frames, vec![10, 10, 20, 20, 30, 30]);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_reverse_export_is_reversed_forward() {
    let dir = test_dir("reverse");
    let sequence = numbered_sequence(&dir, 4);

    let (_, mut forward) = export(&sequence, settings(Direction::Forward, 3), &dir.join("f.mp4"));
    let (_, reverse) = export(&sequence, settings(Direction::Reverse, 3), &dir.join("r.mp4"));

    assert_eq!(reverse.len(), 12);
    forward.reverse();
    assert_eq!(forward, reverse);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_export_uses_export_resolution() {
    let dir = test_dir("resolution");
    let sequence = numbered_sequence(&dir, 1);
    let mut target = settings(Direction::Forward, 1);
    target.resolution = Resolution::Hd1080;

    let mut session = ExportSession::new(&sequence, target, &dir.join("hd.mp4")).unwrap();
    let encoder = RecordingEncoder::default();
    assert_eq!(
        session.step(&encoder).unwrap(),
        ExportStep::Progress { done: 1, total: 1 }
    );

    let scratch = session.scratch_path().unwrap().to_path_buf();
    let first = image::open(scratch.join("frame_0001.png")).unwrap();
    assert_eq!((first.width(), first.height()), (1920, 1080));

    assert!(session.is_encoding_next());
    assert_eq!(
        session.step(&encoder).unwrap(),
        ExportStep::Finished(dir.join("hd.mp4"))
    );
    assert_eq!(*encoder.fps.borrow(), Some(FrameRate::Fps18));
    assert!(!scratch.exists());

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_cancelled_export_leaves_nothing_behind() {
    let dir = test_dir("cancel");
    let sequence = numbered_sequence(&dir, 5);
    let output = dir.join("never.mp4");

    let session = ExportSession::new(&sequence, settings(Direction::Forward, 1), &output).unwrap();
    let scratch = session.scratch_path().unwrap().to_path_buf();
    let encoder = RecordingEncoder::default();
    let mut observer = CancelAfter {
        frames: 2,
        seen: 0,
        encoding: false,
    };

    let err = run_export(session, &encoder, &mut observer).unwrap_err();
    assert!(matches!(err, AnimError::Cancelled));
    assert!(!observer.encoding);
    assert!(!output.exists());
    assert!(!scratch.exists());
    assert!(encoder.frames.borrow().is_empty());

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_encoder_failure_discards_frames() {
    let dir = test_dir("failure");
    let sequence = numbered_sequence(&dir, 2);

    let mut session =
        ExportSession::new(&sequence, settings(Direction::Forward, 1), &dir.join("bad.mp4")).unwrap();
    let scratch = session.scratch_path().unwrap().to_path_buf();
    let encoder = RecordingEncoder {
        fail: true,
        ..Default::default()
    };

    session.step(&encoder).unwrap();
    session.step(&encoder).unwrap();
    let err = session.step(&encoder).unwrap_err();
    assert!(matches!(err, AnimError::Encoder { .. }));
    assert_eq!(session.stage(), ExportStage::Failed);
    assert!(!scratch.exists());

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_cancel_via_session() {
    let dir = test_dir("session_cancel");
    let sequence = numbered_sequence(&dir, 3);

    let mut session =
        ExportSession::new(&sequence, settings(Direction::Reverse, 2), &dir.join("c.mp4")).unwrap();
    let encoder = RecordingEncoder::default();
    session.step(&encoder).unwrap();
    session.cancel();

    assert_eq!(session.stage(), ExportStage::Cancelled);
    assert!(session.scratch_path().is_none());
    assert!(matches!(session.step(&encoder), Err(AnimError::Cancelled)));

    fs::remove_dir_all(&dir).ok();
}
