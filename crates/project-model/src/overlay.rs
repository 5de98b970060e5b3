//! Overlays: text and image annotations drawn over the base frame.
//!
//! Overlay windows are absolute timeline seconds and are independent of
//! the owning clip's trim.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::timeline::TimelineError;

/// Opacity used when an overlay does not set one.
pub const DEFAULT_OPACITY: f64 = 1.0;

/// Reference to a still image owned by the media provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageRef {
    pub path: PathBuf,
}

impl ImageRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// Position on the output surface, in pixels from the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// What an overlay draws.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OverlayKind {
    /// A text string drawn with the default font.
    Text { text: String },
    /// A still image drawn at its native size.
    Image { image: ImageRef },
}

/// A drawable annotation active within `[start, end)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overlay {
    #[serde(flatten)]
    pub kind: OverlayKind,

    pub position: Position,

    #[serde(rename = "start")]
    pub start_secs: f64,

    #[serde(rename = "end")]
    pub end_secs: f64,

    /// Opacity in `[0.0, 1.0]`; `None` means fully opaque.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
}

impl Overlay {
    /// Text overlay with default opacity.
    pub fn text(
        text: impl Into<String>,
        position: Position,
        start_secs: f64,
        end_secs: f64,
    ) -> Self {
        Self {
            kind: OverlayKind::Text { text: text.into() },
            position,
            start_secs,
            end_secs,
            opacity: None,
        }
    }

    /// Image overlay with default opacity.
    pub fn image(image: ImageRef, position: Position, start_secs: f64, end_secs: f64) -> Self {
        Self {
            kind: OverlayKind::Image { image },
            position,
            start_secs,
            end_secs,
            opacity: None,
        }
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = Some(opacity);
        self
    }

    /// Opacity to draw with, defaulting to fully opaque.
    pub fn effective_opacity(&self) -> f64 {
        self.opacity.unwrap_or(DEFAULT_OPACITY)
    }

    /// Whether `t` lies in `[start, end)`.
    pub fn is_active_at(&self, t: f64) -> bool {
        t >= self.start_secs && t < self.end_secs
    }

    pub fn validate(&self) -> Result<(), TimelineError> {
        if !self.start_secs.is_finite()
            || !self.end_secs.is_finite()
            || self.start_secs >= self.end_secs
        {
            return Err(TimelineError::InvalidOverlayWindow {
                start_secs: self.start_secs,
                end_secs: self.end_secs,
            });
        }
        if let Some(opacity) = self.opacity {
            if !(0.0..=1.0).contains(&opacity) {
                return Err(TimelineError::InvalidOpacity { opacity });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_is_half_open() {
        let overlay = Overlay::text("Hi", Position::default(), 2.0, 5.0);
        assert!(overlay.is_active_at(2.0));
        assert!(overlay.is_active_at(4.999));
        assert!(!overlay.is_active_at(5.0));
        assert!(!overlay.is_active_at(1.999));
    }

    #[test]
    fn test_default_opacity() {
        let overlay = Overlay::text("Hi", Position::default(), 0.0, 1.0);
        assert_eq!(overlay.opacity, None);
        assert_eq!(overlay.effective_opacity(), 1.0);
        assert_eq!(overlay.with_opacity(0.25).effective_opacity(), 0.25);
    }

    #[test]
    fn test_validate_rejects_empty_window() {
        let overlay = Overlay::text("Hi", Position::default(), 3.0, 3.0);
        assert!(matches!(
            overlay.validate(),
            Err(TimelineError::InvalidOverlayWindow { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_bad_opacity() {
        let overlay = Overlay::text("Hi", Position::default(), 0.0, 1.0).with_opacity(1.5);
        assert!(matches!(
            overlay.validate(),
            Err(TimelineError::InvalidOpacity { .. })
        ));
    }

    #[test]
    fn test_serde_tagged_variant() {
        let overlay = Overlay::image(
            ImageRef::new("logo.png"),
            Position::new(10.0, 20.0),
            1.0,
            2.0,
        );
        let value = serde_json::to_value(&overlay).unwrap();
        assert_eq!(value["type"], "image");
        assert_eq!(value["start"], 1.0);
        assert!(value.get("opacity").is_none());

        let parsed: Overlay = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, overlay);
    }
}
