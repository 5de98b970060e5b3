//! The timeline: an insertion-ordered collection of clips.
//!
//! Insertion order matters: it is the overlay z-order and the final
//! tie-break for overlapping base clips. Clips on the same track may
//! overlap; resolving overlap is a rendering policy, not a model rule.
//!
//! A timeline must not be mutated while an export reads it. Exports borrow
//! the timeline immutably for their whole run, so within one process the
//! borrow checker enforces this; callers sharing a timeline across tasks
//! must snapshot (clone) it before exporting.

use serde::{Deserialize, Serialize};

use crate::clip::{Clip, ClipId};
use crate::overlay::Overlay;

/// Errors from timeline edits and validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TimelineError {
    #[error("Clip {clip_id}: invalid trim [{in_secs}, {out_secs}) for source of {source_duration_secs}s")]
    InvalidTrim {
        clip_id: ClipId,
        in_secs: f64,
        out_secs: f64,
        source_duration_secs: f64,
    },

    #[error("Clip {clip_id}: start {start_secs}s is negative")]
    NegativeStart { clip_id: ClipId, start_secs: f64 },

    #[error("Clip {clip_id}: {field} is not a finite number")]
    NonFinite {
        clip_id: ClipId,
        field: &'static str,
    },

    #[error("Overlay window [{start_secs}, {end_secs}) is empty or not finite")]
    InvalidOverlayWindow { start_secs: f64, end_secs: f64 },

    #[error("Overlay opacity {opacity} is outside [0, 1]")]
    InvalidOpacity { opacity: f64 },

    #[error("Clip not found: {0}")]
    ClipNotFound(ClipId),

    #[error("Duplicate clip id: {0}")]
    DuplicateClipId(ClipId),

    #[error("Clip {clip_id} has no overlay at index {index}")]
    OverlayNotFound { clip_id: ClipId, index: usize },
}

/// Editing timeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    clips: Vec<Clip>,

    /// Track whose clips provide the base picture.
    #[serde(default)]
    base_track: u32,
}

impl Timeline {
    /// Empty timeline using track 0 as the base track.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty timeline with a custom base track.
    pub fn with_base_track(base_track: u32) -> Self {
        Self {
            clips: Vec::new(),
            base_track,
        }
    }

    pub fn base_track(&self) -> u32 {
        self.base_track
    }

    pub fn set_base_track(&mut self, track: u32) {
        self.base_track = track;
    }

    /// Clips in insertion order.
    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn clip(&self, id: &ClipId) -> Option<&Clip> {
        self.clips.iter().find(|c| &c.id == id)
    }

    /// Clips that contribute to the audio mix.
    pub fn audio_clips(&self) -> impl Iterator<Item = &Clip> {
        self.clips.iter().filter(|c| c.has_audio)
    }

    /// Timeline duration: the latest clip end. Overlays do not extend it.
    pub fn duration_secs(&self) -> f64 {
        self.clips
            .iter()
            .map(Clip::end_secs)
            .fold(0.0, f64::max)
    }

    /// End of the last clip on `track`, or 0 for an empty track.
    pub fn track_end_secs(&self, track: u32) -> f64 {
        self.clips
            .iter()
            .filter(|c| c.track == track)
            .map(Clip::end_secs)
            .fold(0.0, f64::max)
    }

    /// Append a clip after validating it.
    pub fn add_clip(&mut self, clip: Clip) -> Result<&Clip, TimelineError> {
        clip.validate()?;
        if self.clip(&clip.id).is_some() {
            return Err(TimelineError::DuplicateClipId(clip.id));
        }
        self.clips.push(clip);
        Ok(&self.clips[self.clips.len() - 1])
    }

    /// Remove a clip, returning it.
    pub fn remove_clip(&mut self, id: &ClipId) -> Result<Clip, TimelineError> {
        let index = self.index_of(id)?;
        Ok(self.clips.remove(index))
    }

    /// Move a clip to a new placement. Insertion order is unchanged.
    pub fn move_clip(
        &mut self,
        id: &ClipId,
        start_secs: f64,
        track: u32,
    ) -> Result<(), TimelineError> {
        self.edit_clip(id, |clip| {
            clip.start_secs = start_secs;
            clip.track = track;
        })
    }

    /// Change a clip's trim window.
    pub fn trim_clip(
        &mut self,
        id: &ClipId,
        in_secs: f64,
        out_secs: f64,
    ) -> Result<(), TimelineError> {
        self.edit_clip(id, |clip| {
            clip.in_secs = in_secs;
            clip.out_secs = out_secs;
        })
    }

    /// Append an overlay to a clip, returning its index in that clip.
    pub fn add_overlay(&mut self, id: &ClipId, overlay: Overlay) -> Result<usize, TimelineError> {
        overlay.validate()?;
        let index = self.index_of(id)?;
        let overlays = &mut self.clips[index].overlays;
        overlays.push(overlay);
        Ok(overlays.len() - 1)
    }

    /// Remove the overlay at `overlay_index` from a clip.
    pub fn remove_overlay(
        &mut self,
        id: &ClipId,
        overlay_index: usize,
    ) -> Result<Overlay, TimelineError> {
        let index = self.index_of(id)?;
        let clip = &mut self.clips[index];
        if overlay_index >= clip.overlays.len() {
            return Err(TimelineError::OverlayNotFound {
                clip_id: id.clone(),
                index: overlay_index,
            });
        }
        Ok(clip.overlays.remove(overlay_index))
    }

    /// Validate every clip and overlay, including ones loaded via serde.
    pub fn validate(&self) -> Result<(), TimelineError> {
        for (i, clip) in self.clips.iter().enumerate() {
            clip.validate()?;
            if self.clips[..i].iter().any(|c| c.id == clip.id) {
                return Err(TimelineError::DuplicateClipId(clip.id.clone()));
            }
        }
        Ok(())
    }

    fn index_of(&self, id: &ClipId) -> Result<usize, TimelineError> {
        self.clips
            .iter()
            .position(|c| &c.id == id)
            .ok_or_else(|| TimelineError::ClipNotFound(id.clone()))
    }

    /// Apply an edit, rolling back if it breaks an invariant.
    fn edit_clip(
        &mut self,
        id: &ClipId,
        edit: impl FnOnce(&mut Clip),
    ) -> Result<(), TimelineError> {
        let index = self.index_of(id)?;
        let mut updated = self.clips[index].clone();
        edit(&mut updated);
        updated.validate()?;
        self.clips[index] = updated;
        Ok(())
    }
}
