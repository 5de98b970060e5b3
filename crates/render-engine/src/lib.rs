//! Reelcut Render Engine
//!
//! Turns a timeline into pixels and samples, for interactive preview and
//! for offline export.
//!
//! # Pipeline Architecture
//!
//! ```text
//! timeline ──┬── resolve(t) ── paint ── Canvas ──┬── PreviewDriver (frame_at / play)
//!            │       ▲                           │
//!            │   DecodeCache ◄── MediaProvider   └── Encoder.add_video_frame(t, 1/fps)
//!            │       │                                        │
//!            └── mix ┴── AudioBuffer ── Encoder.add_audio_track
//!                                                              ▼
//!                                                  finalize → (bytes, mime type)
//! ```
//!
//! Resolution is pure; painting and mixing only yield at decode calls;
//! export additionally yields at each awaited frame submission.

pub mod audio_mix;
pub mod compositor;
pub mod decode_cache;
pub mod export;
pub mod preview;
pub mod resolver;
pub mod surface;

pub use audio_mix::mix;
pub use compositor::{paint, PaintReport};
pub use decode_cache::{DecodeCache, DecodeSource};
pub use export::*;
pub use preview::PreviewDriver;
pub use resolver::{resolve, BaseFrame, OverlayInstance, ResolvedFrame};
pub use surface::{load_font, Canvas, SharedFont, Surface};
