//! Reelcut Media I/O
//!
//! The boundary between the timeline core and real media:
//! - **Provider contract:** open sources, decode frames and audio ranges,
//!   load overlay images, probe encodable formats, and create encoders
//! - **Audio buffers:** interleaved `f32` PCM in a fixed target format
//! - **ffmpeg provider:** a process-backed implementation of the contract
//!
//! Every decode and encode call is `async`; these are the only points at
//! which rendering yields.

pub mod audio;
pub mod ffmpeg;
pub mod provider;

pub use audio::*;
pub use ffmpeg::{FfmpegProvider, ProbeInfo};
pub use provider::*;
