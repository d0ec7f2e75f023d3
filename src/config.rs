//! Export presets: resolution, frame rate, direction and frame hold.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::AnimError;

/// Output resolution presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Resolution {
    #[serde(rename = "720p")]
    Hd720,
    #[default]
    #[serde(rename = "1080p")]
    Hd1080,
    #[serde(rename = "4K")]
    Uhd4k,
    #[serde(rename = "8K")]
    Uhd8k,
}

impl Resolution {
    pub const ALL: [Resolution; 4] = [
        Resolution::Hd720,
        Resolution::Hd1080,
        Resolution::Uhd4k,
        Resolution::Uhd8k,
    ];

    pub fn dimensions(self) -> (u32, u32) {
        match self {
            Resolution::Hd720 => (1280, 720),
            Resolution::Hd1080 => (1920, 1080),
            Resolution::Uhd4k => (3840, 2160),
            Resolution::Uhd8k => (7680, 4320),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Resolution::Hd720 => "720p",
            Resolution::Hd1080 => "1080p",
            Resolution::Uhd4k => "4K",
            Resolution::Uhd8k => "8K",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Resolution {
    type Err = AnimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "720p" => Ok(Resolution::Hd720),
            "1080p" => Ok(Resolution::Hd1080),
            "4k" => Ok(Resolution::Uhd4k),
            "8k" => Ok(Resolution::Uhd8k),
            _ => Err(AnimError::invalid_setting(format!(
                "Unknown resolution '{}' (expected 720p, 1080p, 4K or 8K)",
                s
            ))),
        }
    }
}

/// Playback and export frame rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum FrameRate {
    Fps18,
    #[default]
    Fps24,
    Fps30,
}

impl FrameRate {
    pub const ALL: [FrameRate; 3] = [FrameRate::Fps18, FrameRate::Fps24, FrameRate::Fps30];

    pub fn as_u32(self) -> u32 {
        match self {
            FrameRate::Fps18 => 18,
            FrameRate::Fps24 => 24,
            FrameRate::Fps30 => 30,
        }
    }

    /// Timer period for one playback tick, truncated to whole milliseconds.
    pub fn tick_interval(self) -> Duration {
        Duration::from_millis(u64::from(1000 / self.as_u32()))
    }
}

impl TryFrom<u32> for FrameRate {
    type Error = AnimError;

    fn try_from(fps: u32) -> Result<Self, Self::Error> {
        match fps {
            18 => Ok(FrameRate::Fps18),
            24 => Ok(FrameRate::Fps24),
            30 => Ok(FrameRate::Fps30),
            other => Err(AnimError::invalid_setting(format!(
                "Unsupported frame rate {} (expected 18, 24 or 30)",
                other
            ))),
        }
    }
}

impl From<FrameRate> for u32 {
    fn from(fps: FrameRate) -> u32 {
        fps.as_u32()
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_u32())
    }
}

impl FromStr for FrameRate {
    type Err = AnimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fps = s
            .trim()
            .parse::<u32>()
            .map_err(|_| AnimError::invalid_setting(format!("Invalid fps value: {}", s)))?;
        FrameRate::try_from(fps)
    }
}

/// Order in which frames are played or exported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Forward,
    Reverse,
}

impl Direction {
    pub const ALL: [Direction; 2] = [Direction::Forward, Direction::Reverse];

    pub fn sign(self) -> isize {
        match self {
            Direction::Forward => 1,
            Direction::Reverse => -1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Direction::Forward => "Forward",
            Direction::Reverse => "Reverse",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Direction {
    type Err = AnimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "forward" => Ok(Direction::Forward),
            "reverse" => Ok(Direction::Reverse),
            _ => Err(AnimError::invalid_setting(format!(
                "Unknown direction '{}' (expected forward or reverse)",
                s
            ))),
        }
    }
}

/// How many ticks (and exported frames) each source image is held for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct FrameHold(u8);

impl FrameHold {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 9;

    pub fn new(value: u8) -> Result<Self, AnimError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(FrameHold(value))
        } else {
            Err(AnimError::invalid_setting(format!(
                "Frame hold must be between {} and {}, got {}",
                Self::MIN,
                Self::MAX,
                value
            )))
        }
    }

    pub fn clamped(value: i64) -> Self {
        FrameHold(value.clamp(i64::from(Self::MIN), i64::from(Self::MAX)) as u8)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn as_usize(self) -> usize {
        usize::from(self.0)
    }
}

impl Default for FrameHold {
    fn default() -> Self {
        FrameHold(1)
    }
}

impl TryFrom<u8> for FrameHold {
    type Error = AnimError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        FrameHold::new(value)
    }
}

impl From<FrameHold> for u8 {
    fn from(hold: FrameHold) -> u8 {
        hold.0
    }
}

impl fmt::Display for FrameHold {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything an export needs to know besides the frames themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExportSettings {
    pub resolution: Resolution,
    pub fps: FrameRate,
    pub direction: Direction,
    pub frame_hold: FrameHold,
}
