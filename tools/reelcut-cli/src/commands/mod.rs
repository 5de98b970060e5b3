pub mod check;
pub mod config;
pub mod export;
pub mod preview;
pub mod probe;
pub mod timeline_args;

use reelcut_common::config::MediaConfig;
use reelcut_render_engine::surface::{load_font, SharedFont};

/// Load the configured overlay font, warning if it is unusable.
pub fn overlay_font(media: &MediaConfig) -> Option<SharedFont> {
    let path = media.font_path.as_ref()?;
    match load_font(path) {
        Ok(font) => Some(font),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Overlay font unavailable");
            None
        }
    }
}
