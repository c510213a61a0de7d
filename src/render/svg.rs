use anyhow::Result;
use image::{Rgb, RgbImage};
use resvg::render;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tiny_skia::Pixmap;
use tracing::{debug, warn};
use usvg::{Options, Tree, fontdb};

use super::font::{ResolvedFont, measure_text_width_px, resolve_font};
use super::layout::{LayoutConfig, PlacedWord, count_words, layout_words};
use super::palette::{Palette, hex_color};
use super::{Rasterizer, RenderError, RenderSpec};

pub const DEFAULT_MAX_WORDS: usize = 200;
/// Portion of each colour map used for words. Excludes the near-white ends
/// of the sequential maps.
const COLOR_RANGE: (f32, f32) = (0.15, 0.85);

/// Default rasterizer: spiral layout drawn as SVG text and rendered with
/// resvg. The font database is loaded once and shared across requests.
pub struct SvgRasterizer {
    fontdb: Arc<fontdb::Database>,
    font: Option<ResolvedFont>,
    max_words: usize,
}

impl SvgRasterizer {
    pub fn new(
        font_path: Option<&Path>,
        font_family: Option<&str>,
        max_words: usize,
    ) -> Result<Self> {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        let font = match resolve_font(&db, font_path, font_family) {
            Ok(font) => {
                if font_path.is_some() {
                    db.load_font_data(font.metrics.data().to_vec());
                }
                debug!("word cloud font: {}", font.family);
                Some(font)
            }
            Err(err) if font_path.is_some() => return Err(err),
            Err(err) => {
                warn!("no usable font found ({}); words will be sized by estimate", err);
                None
            }
        };
        Ok(Self {
            fontdb: Arc::new(db),
            font,
            max_words: max_words.max(1),
        })
    }

    pub fn font_family(&self) -> Option<&str> {
        self.font.as_ref().map(|font| font.family.as_str())
    }

    fn layout(&self, spec: &RenderSpec) -> Vec<PlacedWord> {
        let words = count_words(&spec.corpus.as_text(), self.max_words);
        let config = LayoutConfig::for_canvas(spec.width, spec.height);
        let metrics = self.font.as_ref().map(|font| &font.metrics);
        layout_words(&words, spec.mask.as_ref(), &config, |word, size| {
            measure_text_width_px(word, size, metrics)
        })
    }
}

impl Rasterizer for SvgRasterizer {
    fn rasterize(&self, spec: &RenderSpec) -> Result<RgbImage, RenderError> {
        let palette = Palette::by_name(&spec.color_palette)
            .ok_or_else(|| RenderError::UnknownPalette(spec.color_palette.clone()))?;
        let started = Instant::now();
        let placed = self.layout(spec);
        let ascent = self
            .font
            .as_ref()
            .map(|font| font.metrics.ascent_ratio())
            .unwrap_or(0.9);
        let svg = compose_svg(
            &placed,
            spec.width,
            spec.height,
            spec.background,
            &palette,
            self.font_family(),
            ascent,
        );
        let image = rasterize_svg(&svg, self.fontdb.clone())?;
        debug!(
            "rasterized {} of {} tokens into {}x{} in {:?}",
            placed.len(),
            spec.corpus.len(),
            spec.width,
            spec.height,
            started.elapsed()
        );
        Ok(image)
    }
}

pub(crate) fn compose_svg(
    placed: &[PlacedWord],
    width: u32,
    height: u32,
    background: Rgb<u8>,
    palette: &Palette,
    font_family: Option<&str>,
    ascent: f32,
) -> String {
    let mut svg = String::new();
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = width,
        h = height
    ));
    svg.push_str(&format!(
        r#"<rect x="0" y="0" width="{w}" height="{h}" fill="{fill}"/>"#,
        w = width,
        h = height,
        fill = hex_color(background)
    ));
    let last_rank = placed.iter().map(|word| word.rank).max().unwrap_or(0).max(1);
    for word in placed {
        let color = palette.sample(rank_position(word.rank, last_rank));
        let baseline = word.y + word.font_size * ascent;
        match font_family {
            Some(family) => svg.push_str(&format!(
                r#"<text x="{x}" y="{y}" font-size="{size}" fill="{color}" font-family="{family}">{text}</text>"#,
                x = word.x,
                y = baseline,
                size = word.font_size,
                color = hex_color(color),
                family = escape_xml(family),
                text = escape_xml(&word.word)
            )),
            None => svg.push_str(&format!(
                r#"<text x="{x}" y="{y}" font-size="{size}" fill="{color}">{text}</text>"#,
                x = word.x,
                y = baseline,
                size = word.font_size,
                color = hex_color(color),
                text = escape_xml(&word.word)
            )),
        }
    }
    svg.push_str("</svg>");
    svg
}

fn rank_position(rank: usize, last_rank: usize) -> f32 {
    let (low, high) = COLOR_RANGE;
    low + (high - low) * (rank as f32 / last_rank as f32)
}

fn rasterize_svg(svg: &str, fontdb: Arc<fontdb::Database>) -> Result<RgbImage, RenderError> {
    let options = Options {
        fontdb,
        ..Options::default()
    };
    let tree = Tree::from_str(svg, &options)
        .map_err(|err| RenderError::Rasterize(format!("failed to parse SVG: {}", err)))?;
    let size = tree.size().to_int_size();
    let mut pixmap = Pixmap::new(size.width(), size.height())
        .ok_or_else(|| RenderError::Rasterize("empty SVG size".to_string()))?;
    render(&tree, tiny_skia::Transform::identity(), &mut pixmap.as_mut());
    // The background rect is opaque, so premultiplied and straight RGB agree.
    let rgb = pixmap
        .data()
        .chunks_exact(4)
        .flat_map(|pixel| [pixel[0], pixel[1], pixel[2]])
        .collect::<Vec<_>>();
    RgbImage::from_raw(size.width(), size.height(), rgb).ok_or_else(|| {
        RenderError::Rasterize("failed to build image buffer from SVG".to_string())
    })
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use crate::render::{BACKGROUND, PALETTE_NAMES, Shape, build_render_spec};

    fn rasterizer() -> SvgRasterizer {
        SvgRasterizer::new(None, None, DEFAULT_MAX_WORDS).expect("rasterizer")
    }

    #[test]
    fn rectangle_renders_at_canvas_size() {
        let corpus = normalize("test word cloud generation test", None).unwrap();
        let spec = build_render_spec(corpus, Shape::Rectangle, "viridis");
        let image = rasterizer().rasterize(&spec).unwrap();
        assert_eq!(image.dimensions(), (800, 400));
    }

    #[test]
    fn sphere_corners_stay_background() {
        let corpus = normalize("hello world test cloud generation", None).unwrap();
        let spec = build_render_spec(corpus, Shape::Sphere, "Blues");
        let image = rasterizer().rasterize(&spec).unwrap();
        assert_eq!(image.dimensions(), (800, 800));
        assert_eq!(*image.get_pixel(0, 0), Rgb([255, 255, 255]));
        assert_eq!(*image.get_pixel(799, 799), Rgb([255, 255, 255]));
    }

    #[test]
    fn unknown_palette_is_a_render_error() {
        let corpus = normalize("words", None).unwrap();
        let spec = build_render_spec(corpus, Shape::Rectangle, "no-such-map");
        let err = rasterizer().rasterize(&spec).unwrap_err();
        assert!(matches!(err, RenderError::UnknownPalette(name) if name == "no-such-map"));
    }

    #[test]
    fn no_word_is_drawn_in_the_background_colour() {
        let placed = (0..5)
            .map(|rank| PlacedWord {
                word: format!("w{}", rank),
                font_size: 20.0,
                x: 10.0,
                y: 30.0 * rank as f32,
                width: 40.0,
                height: 24.0,
                rank,
            })
            .collect::<Vec<_>>();
        let background = hex_color(BACKGROUND);
        let fill = format!(r#"fill="{}""#, background);
        for name in PALETTE_NAMES {
            for name in [name.to_string(), format!("{}_r", name)] {
                let palette = Palette::by_name(&name).unwrap();
                let svg = compose_svg(&placed, 800, 400, BACKGROUND, &palette, None, 1.0);
                assert_eq!(svg.matches(&fill).count(), 1, "{}", name);
            }
        }
    }

    #[test]
    fn svg_escapes_markup_and_colours_by_rank() {
        let palette = Palette::by_name("Greys").unwrap();
        let placed = vec![
            PlacedWord {
                word: "a<b".to_string(),
                font_size: 40.0,
                x: 10.0,
                y: 20.0,
                width: 60.0,
                height: 48.0,
                rank: 0,
            },
            PlacedWord {
                word: "tom&jerry".to_string(),
                font_size: 20.0,
                x: 100.0,
                y: 20.0,
                width: 60.0,
                height: 24.0,
                rank: 1,
            },
        ];
        let svg = compose_svg(
            &placed,
            800,
            400,
            Rgb([255, 255, 255]),
            &palette,
            Some("Test Sans"),
            1.0,
        );
        assert!(svg.contains("a&lt;b"));
        assert!(svg.contains("tom&amp;jerry"));
        assert_eq!(svg.matches(r##"fill="#ffffff""##).count(), 1);
        assert!(svg.contains(r##"fill="#e8e8e8""##));
        assert!(svg.contains(r##"fill="#313131""##));
        assert!(svg.contains(r#"y="60""#));
        assert!(svg.contains(r#"font-family="Test Sans""#));
    }
}
