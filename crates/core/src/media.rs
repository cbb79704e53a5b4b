// Content and backend descriptors shared across the stack

use crate::error::PlayerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of media behind a URI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Dash,
    Hls,
    SmoothStreaming,
    /// Progressive media (mp4/h264)
    H264,
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Dash => "dash",
            ContentType::Hls => "hls",
            ContentType::SmoothStreaming => "smooth_streaming",
            ContentType::H264 => "h264",
        }
    }
}

impl FromStr for ContentType {
    type Err = PlayerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dash" | "mpd" => Ok(ContentType::Dash),
            "hls" | "m3u8" => Ok(ContentType::Hls),
            "ss" | "smoothstreaming" | "smooth_streaming" => Ok(ContentType::SmoothStreaming),
            "h264" | "mp4" => Ok(ContentType::H264),
            _ => Err(PlayerError::InvalidContentType(s.to_string())),
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which engine family a backend adapter wraps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Platform media player
    Native,
    /// Third-party adaptive streaming player
    #[default]
    Adaptive,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Native => f.write_str("native"),
            BackendKind::Adaptive => f.write_str("adaptive"),
        }
    }
}
