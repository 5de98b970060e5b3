//! Drawing surfaces for the compositor.
//!
//! [`Surface`] is the 2D drawing contract the compositor paints through.
//! [`Canvas`] is the in-memory RGBA implementation used by preview and
//! export; its pixels are what gets handed to the encoder.

use std::path::Path;
use std::sync::Arc;

use ab_glyph::{Font, FontVec, PxScale, ScaleFont};
use image::{imageops, Rgba, RgbaImage};

use reelcut_common::error::{ReelcutError, ReelcutResult};
use reelcut_project_model::overlay::Position;

/// Pixel size of the default overlay font.
pub const DEFAULT_FONT_SIZE: f32 = 24.0;

/// Colour of overlay text.
pub const TEXT_COLOR: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// A font shared between surfaces.
pub type SharedFont = Arc<FontVec>;

/// Load a TrueType/OpenType font from disk.
pub fn load_font(path: &Path) -> ReelcutResult<SharedFont> {
    let bytes = std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ReelcutError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            ReelcutError::Io(e)
        }
    })?;
    let font = FontVec::try_from_vec(bytes)
        .map_err(|e| ReelcutError::config(format!("invalid font {}: {e}", path.display())))?;
    Ok(Arc::new(font))
}

/// A 2D drawing target with a current global opacity.
pub trait Surface {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Reset every pixel to transparent.
    fn clear(&mut self);

    /// Opacity applied to subsequent draws.
    fn opacity(&self) -> f64;

    fn set_opacity(&mut self, opacity: f64);

    /// Draw `image` stretched over the full surface bounds.
    fn draw_image_fill(&mut self, image: &RgbaImage);

    /// Draw `image` at native size with its top-left corner at `position`.
    fn draw_image(&mut self, image: &RgbaImage, position: Position);

    /// Draw `text` with the default font, baseline starting at `position`.
    /// Returns `false` when the surface cannot render text.
    fn draw_text(&mut self, text: &str, position: Position) -> bool;
}

/// In-memory RGBA surface.
#[derive(Clone)]
pub struct Canvas {
    pixels: RgbaImage,
    opacity: f64,
    font: Option<SharedFont>,
    warned_missing_font: bool,
}

impl std::fmt::Debug for Canvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Canvas")
            .field("width", &self.pixels.width())
            .field("height", &self.pixels.height())
            .field("opacity", &self.opacity)
            .field("has_font", &self.font.is_some())
            .finish()
    }
}

impl Canvas {
    /// A transparent canvas without a font; text draws are skipped.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::new(width, height),
            opacity: 1.0,
            font: None,
            warned_missing_font: false,
        }
    }

    pub fn with_font(mut self, font: Option<SharedFont>) -> Self {
        self.font = font;
        self
    }

    /// Current pixels.
    pub fn image(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Composite `layer` onto the canvas with its top-left at `(x, y)`.
    fn blend_layer(&mut self, layer: &RgbaImage, x: i64, y: i64) {
        let opacity = self.opacity.clamp(0.0, 1.0);
        if opacity <= 0.0 {
            return;
        }
        let (width, height) = (self.pixels.width() as i64, self.pixels.height() as i64);
        for (lx, ly, src) in layer.enumerate_pixels() {
            let dx = x + lx as i64;
            let dy = y + ly as i64;
            if dx < 0 || dy < 0 || dx >= width || dy >= height {
                continue;
            }
            let dst = self.pixels.get_pixel_mut(dx as u32, dy as u32);
            blend_over(dst, *src, opacity);
        }
    }
}

impl Surface for Canvas {
    fn width(&self) -> u32 {
        self.pixels.width()
    }

    fn height(&self) -> u32 {
        self.pixels.height()
    }

    fn clear(&mut self) {
        for pixel in self.pixels.pixels_mut() {
            *pixel = Rgba([0, 0, 0, 0]);
        }
    }

    fn opacity(&self) -> f64 {
        self.opacity
    }

    fn set_opacity(&mut self, opacity: f64) {
        self.opacity = opacity;
    }

    fn draw_image_fill(&mut self, image: &RgbaImage) {
        let (width, height) = (self.width(), self.height());
        if image.width() == width && image.height() == height {
            self.blend_layer(image, 0, 0);
        } else {
            let scaled = imageops::resize(image, width, height, imageops::FilterType::Triangle);
            self.blend_layer(&scaled, 0, 0);
        }
    }

    fn draw_image(&mut self, image: &RgbaImage, position: Position) {
        self.blend_layer(image, position.x.round() as i64, position.y.round() as i64);
    }

    fn draw_text(&mut self, text: &str, position: Position) -> bool {
        let Some(font) = self.font.clone() else {
            if !self.warned_missing_font {
                tracing::warn!("No overlay font configured, skipping text overlays");
                self.warned_missing_font = true;
            }
            return false;
        };
        if text.is_empty() {
            return true;
        }

        let scale = PxScale::from(DEFAULT_FONT_SIZE);
        let scaled = font.as_scaled(scale);
        let ascent = scaled.ascent();
        let line_height = (scaled.ascent() - scaled.descent()).ceil().max(1.0) as u32;
        let (text_width, _) = imageproc::drawing::text_size(scale, &*font, text);

        // Render glyph coverage into a transparent layer, then blend it so
        // the surface opacity applies uniformly.
        let mut layer = RgbaImage::new(text_width.max(1) + 2, line_height + 2);
        imageproc::drawing::draw_text_mut(&mut layer, TEXT_COLOR, 0, 0, scale, &*font, text);

        let top = position.y - ascent as f64;
        self.blend_layer(&layer, position.x.round() as i64, top.round() as i64);
        true
    }
}

/// Source-over blend of `src` onto `dst`, with `src` alpha scaled by `opacity`.
fn blend_over(dst: &mut Rgba<u8>, src: Rgba<u8>, opacity: f64) {
    let src_a = (src[3] as f64 / 255.0) * opacity;
    if src_a <= 0.0 {
        return;
    }
    let dst_a = dst[3] as f64 / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);
    if out_a <= 0.0 {
        *dst = Rgba([0, 0, 0, 0]);
        return;
    }
    for c in 0..3 {
        let s = src[c] as f64 / 255.0;
        let d = dst[c] as f64 / 255.0;
        let out = (s * src_a + d * dst_a * (1.0 - src_a)) / out_a;
        dst[c] = (out * 255.0).round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}
