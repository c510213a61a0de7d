use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::{GrayImage, Rgb, RgbImage};
use serde::{Deserialize, Serialize};
use std::io::Cursor;

use crate::normalize::NormalizedCorpus;

mod font;
mod layout;
mod mask;
mod palette;
mod svg;

pub use font::{FontMetrics, ResolvedFont, measure_text_width_px, resolve_font};
pub use layout::{LayoutConfig, PlacedWord, WordFrequency, count_words, layout_words};
pub use mask::{MASK_AVAILABLE, MASK_EXCLUDED, circular_mask, is_excluded};
pub use palette::{PALETTE_NAMES, Palette};
pub use svg::{DEFAULT_MAX_WORDS, SvgRasterizer};

pub const CANVAS_WIDTH: u32 = 800;
pub const RECTANGLE_HEIGHT: u32 = 400;
pub const SPHERE_HEIGHT: u32 = 800;
pub const DEFAULT_PALETTE: &str = "viridis";
pub const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    #[default]
    Rectangle,
    Sphere,
}

impl Shape {
    pub const ALL: [Shape; 2] = [Shape::Rectangle, Shape::Sphere];

    pub fn as_str(&self) -> &'static str {
        match self {
            Shape::Rectangle => "rectangle",
            Shape::Sphere => "sphere",
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            Shape::Rectangle => RECTANGLE_HEIGHT,
            Shape::Sphere => SPHERE_HEIGHT,
        }
    }
}

/// Everything the rasterizer needs for one image. Built per request.
#[derive(Debug, Clone)]
pub struct RenderSpec {
    pub corpus: NormalizedCorpus,
    pub width: u32,
    pub height: u32,
    /// Nonzero pixels are closed to text placement.
    pub mask: Option<GrayImage>,
    pub color_palette: String,
    pub background: Rgb<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Unknown color palette '{0}'")]
    UnknownPalette(String),
    #[error("Rasterization failed: {0}")]
    Rasterize(String),
    #[error("Image encoding failed: {0}")]
    Encode(String),
}

/// Lays out and draws a corpus. Implementations must not keep state between
/// calls that depends on earlier requests.
pub trait Rasterizer: Send + Sync {
    fn rasterize(&self, spec: &RenderSpec) -> Result<RgbImage, RenderError>;
}

pub fn build_render_spec(corpus: NormalizedCorpus, shape: Shape, color_palette: &str) -> RenderSpec {
    let height = shape.height();
    let mask = match shape {
        Shape::Rectangle => None,
        Shape::Sphere => Some(circular_mask(CANVAS_WIDTH)),
    };
    RenderSpec {
        corpus,
        width: CANVAS_WIDTH,
        height,
        mask,
        color_palette: color_palette.to_string(),
        background: BACKGROUND,
    }
}

pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>, RenderError> {
    let mut bytes = Vec::new();
    let mut cursor = Cursor::new(&mut bytes);
    image
        .write_to(&mut cursor, image::ImageFormat::Png)
        .map_err(|err| RenderError::Encode(err.to_string()))?;
    Ok(bytes)
}

/// Rasterizes `spec` and returns the PNG as standard base64.
pub fn render_to_base64(
    spec: &RenderSpec,
    rasterizer: &dyn Rasterizer,
) -> Result<String, RenderError> {
    let image = rasterizer.rasterize(spec)?;
    let png = encode_png(&image)?;
    Ok(BASE64.encode(png))
}
