use anyhow::{Context, Result, anyhow};

pub mod credential;
pub mod data;
pub mod extract;
pub mod logging;
pub mod normalize;
pub mod providers;
pub mod render;
pub mod server;
pub mod settings;

pub use credential::{CREDENTIAL_HEADER, Credential};
pub use normalize::{NormalizedCorpus, normalize};
pub use providers::{Gemini, GenerateError, Generator};
pub use render::{Rasterizer, RenderSpec, Shape, SvgRasterizer};
pub use server::{AppState, build_router, run_server};
pub use settings::Settings;

#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub shape: Shape,
    pub color_palette: String,
    pub exclude_words: Option<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            shape: Shape::default(),
            color_palette: render::DEFAULT_PALETTE.to_string(),
            exclude_words: None,
        }
    }
}

/// Normalizes `input` and renders it to PNG bytes with the configured
/// rasterizer. This is the render path of the HTTP surface without the base64
/// wrapping.
pub fn render_png(input: &str, config: &RenderConfig, settings: &Settings) -> Result<Vec<u8>> {
    let input = input.trim();
    if input.is_empty() {
        return Err(anyhow!("input text is empty"));
    }
    let rasterizer = SvgRasterizer::new(
        settings.font_path.as_deref(),
        settings.font_family.as_deref(),
        settings.max_words,
    )?;
    let corpus = normalize(input, config.exclude_words.as_deref())?;
    let spec = render::build_render_spec(corpus, config.shape, &config.color_palette);
    let image = rasterizer
        .rasterize(&spec)
        .with_context(|| "failed to rasterize word cloud")?;
    let png = render::encode_png(&image)?;
    Ok(png)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_png_writes_png_signature() {
        let png = render_png(
            "ferris crab ferris rust",
            &RenderConfig::default(),
            &Settings::default(),
        )
        .unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn render_png_rejects_empty_input() {
        let err = render_png("  \n", &RenderConfig::default(), &Settings::default()).unwrap_err();
        assert_eq!(err.to_string(), "input text is empty");
    }

    #[test]
    fn render_png_surfaces_empty_corpus() {
        let config = RenderConfig {
            exclude_words: Some("ferris".to_string()),
            ..RenderConfig::default()
        };
        let err = render_png("Ferris ferris", &config, &Settings::default()).unwrap_err();
        assert!(err.to_string().starts_with("No words left to render"));
    }
}
