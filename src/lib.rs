//! Stop-motion flipbook core: load stills, play them back, export to MP4.

pub mod composite;
pub mod config;
pub mod encoder;
pub mod error;
pub mod export;
pub mod playback;
pub mod sequence;
pub mod settings;

pub use composite::{composite, composite_rgb, fit_within};
pub use config::{Direction, ExportSettings, FrameHold, FrameRate, Resolution};
pub use encoder::{FfmpegEncoder, FrameSet, VideoEncoder};
pub use error::{AnimError, AnimResult};
pub use export::{
    ensure_mp4_extension, frame_order, run_export, ExportObserver, ExportSession, ExportStage,
    ExportStep,
};
pub use playback::{Playback, PlaybackMode, TickClock};
pub use sequence::{is_supported_image, scan_directory, Frame, ImageSequence, SequenceLoader};
pub use settings::{AppSettings, WindowGeometry};
