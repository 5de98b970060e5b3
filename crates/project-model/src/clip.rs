//! Clips: trimmed source media placed on the timeline.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::overlay::Overlay;
use crate::timeline::TimelineError;

/// Stable identity of a clip within an editing session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClipId(String);

impl ClipId {
    /// Generate a fresh random (UUID v4) identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ClipId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ClipId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reference to decodable media owned by the media provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    /// Location of the media, as understood by the provider.
    pub path: PathBuf,

    /// Total duration of the source in seconds.
    pub duration_secs: f64,
}

impl SourceRef {
    pub fn new(path: impl Into<PathBuf>, duration_secs: f64) -> Self {
        Self {
            path: path.into(),
            duration_secs,
        }
    }
}

/// One media source placed on the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    pub id: ClipId,

    pub source: SourceRef,

    /// Trim start in source time (inclusive).
    #[serde(rename = "in")]
    pub in_secs: f64,

    /// Trim end in source time (exclusive).
    #[serde(rename = "out")]
    pub out_secs: f64,

    /// Placement on the timeline clock.
    #[serde(rename = "start")]
    pub start_secs: f64,

    /// Track index. Track 0 is the default base track.
    pub track: u32,

    /// Whether this clip contributes to the audio mix.
    pub has_audio: bool,

    /// Overlays in z-order (later entries draw on top).
    #[serde(default)]
    pub overlays: Vec<Overlay>,
}

impl Clip {
    /// Create a validated clip with a fresh id.
    pub fn new(
        source: SourceRef,
        in_secs: f64,
        out_secs: f64,
        start_secs: f64,
        track: u32,
        has_audio: bool,
    ) -> Result<Self, TimelineError> {
        let clip = Self {
            id: ClipId::generate(),
            source,
            in_secs,
            out_secs,
            start_secs,
            track,
            has_audio,
            overlays: Vec::new(),
        };
        clip.validate()?;
        Ok(clip)
    }

    /// A clip using the whole source, placed at the start of track 0.
    ///
    /// This is how freshly imported media enters a timeline.
    pub fn from_source(source: SourceRef, has_audio: bool) -> Result<Self, TimelineError> {
        let out = source.duration_secs;
        Self::new(source, 0.0, out, 0.0, 0, has_audio)
    }

    /// Replace the generated id (for callers with their own identities).
    pub fn with_id(mut self, id: impl Into<ClipId>) -> Self {
        self.id = id.into();
        self
    }

    /// Attach an overlay, validating it first.
    pub fn with_overlay(mut self, overlay: Overlay) -> Result<Self, TimelineError> {
        overlay.validate()?;
        self.overlays.push(overlay);
        Ok(self)
    }

    /// Length of the trim window, which is also the length on the timeline.
    pub fn duration_secs(&self) -> f64 {
        self.out_secs - self.in_secs
    }

    /// Exclusive end of the active timeline interval.
    pub fn end_secs(&self) -> f64 {
        self.start_secs + self.duration_secs()
    }

    /// Whether `t` lies in `[start, end_secs())`.
    ///
    /// Activity, [`Clip::end_secs`] and timeline duration all use the same
    /// timeline-time bound, so back-to-back clips leave no gap between them.
    pub fn is_active_at(&self, t: f64) -> bool {
        t >= self.start_secs && t < self.end_secs()
    }

    /// Source time shown at timeline time `t`, if the clip is active.
    ///
    /// The result is always inside `[in, out)`. When rounding carries
    /// `t - start + in` onto `out`, the last frame of the window is used.
    pub fn source_time_at(&self, t: f64) -> Option<f64> {
        if !self.is_active_at(t) {
            return None;
        }
        let source_time = (t - self.start_secs + self.in_secs).max(self.in_secs);
        if source_time < self.out_secs {
            Some(source_time)
        } else {
            Some(float_below(self.out_secs).max(self.in_secs))
        }
    }

    /// Check trim, placement, and overlay invariants.
    pub fn validate(&self) -> Result<(), TimelineError> {
        for (field, value) in [
            ("in", self.in_secs),
            ("out", self.out_secs),
            ("start", self.start_secs),
            ("source.duration", self.source.duration_secs),
        ] {
            if !value.is_finite() {
                return Err(TimelineError::NonFinite {
                    clip_id: self.id.clone(),
                    field,
                });
            }
        }

        if self.in_secs < 0.0
            || self.in_secs >= self.out_secs
            || self.out_secs > self.source.duration_secs
        {
            return Err(TimelineError::InvalidTrim {
                clip_id: self.id.clone(),
                in_secs: self.in_secs,
                out_secs: self.out_secs,
                source_duration_secs: self.source.duration_secs,
            });
        }

        if self.start_secs < 0.0 {
            return Err(TimelineError::NegativeStart {
                clip_id: self.id.clone(),
                start_secs: self.start_secs,
            });
        }

        for overlay in &self.overlays {
            overlay.validate()?;
        }
        Ok(())
    }
}

/// The largest `f64` strictly below `x`, for positive finite `x`.
/// Other values are returned unchanged.
fn float_below(x: f64) -> f64 {
    if x > 0.0 && x.is_finite() {
        f64::from_bits(x.to_bits() - 1)
    } else {
        x
    }
}
