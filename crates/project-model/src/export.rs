//! Export output configuration.
//!
//! These types describe the rendered artifact, not the timeline. A
//! [`FormatSelection`] is resolved once per export by probing the media
//! provider with [`FormatSelection::PREFERENCE`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Output container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerFormat {
    Mp4,
    Webm,
}

impl ContainerFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Mp4 => "video/mp4",
            Self::Webm => "video/webm",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Webm => "webm",
        }
    }
}

/// Output video codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoCodec {
    H264,
    Vp9,
    Vp8,
}

/// Output audio codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioCodec {
    Aac,
    Opus,
}

/// A resolved `(container, video codec, audio codec)` triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FormatSelection {
    pub container: ContainerFormat,
    pub video_codec: VideoCodec,
    pub audio_codec: AudioCodec,
}

impl FormatSelection {
    /// Candidates in the order they are probed: MP4 first, WebM as fallback.
    pub const PREFERENCE: [FormatSelection; 3] = [
        FormatSelection {
            container: ContainerFormat::Mp4,
            video_codec: VideoCodec::H264,
            audio_codec: AudioCodec::Aac,
        },
        FormatSelection {
            container: ContainerFormat::Webm,
            video_codec: VideoCodec::Vp9,
            audio_codec: AudioCodec::Opus,
        },
        FormatSelection {
            container: ContainerFormat::Webm,
            video_codec: VideoCodec::Vp8,
            audio_codec: AudioCodec::Opus,
        },
    ];

    pub fn mime_type(&self) -> &'static str {
        self.container.mime_type()
    }
}

impl fmt::Display for FormatSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}/{:?}+{:?}",
            self.container, self.video_codec, self.audio_codec
        )
    }
}

/// Export parameters chosen by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExportSettings {
    /// Output resolution in pixels.
    pub width: u32,
    pub height: u32,

    /// Output frame rate.
    pub fps: u32,

    /// Mixed audio sample rate.
    pub sample_rate: u32,

    /// Mixed audio channel count.
    pub channels: u16,
}

impl ExportSettings {
    /// Settings at the default 30 fps, 48 kHz stereo.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            fps: 30,
            sample_rate: 48000,
            channels: 2,
        }
    }
}
