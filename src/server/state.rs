use anyhow::Result;
use std::sync::Arc;

use super::client::render_page;
use crate::providers::{Gemini, Generator};
use crate::render::{Rasterizer, SvgRasterizer};
use crate::settings::Settings;

/// Read-only state shared by every handler. Per-request data, the
/// credential included, never lands here.
pub struct AppState {
    pub(crate) settings: Settings,
    pub(crate) generator: Arc<dyn Generator>,
    pub(crate) rasterizer: Arc<dyn Rasterizer>,
    pub(crate) page: String,
}

impl AppState {
    pub fn new(
        settings: Settings,
        generator: Arc<dyn Generator>,
        rasterizer: Arc<dyn Rasterizer>,
    ) -> Result<Self> {
        let page = render_page(&settings)?;
        Ok(Self {
            settings,
            generator,
            rasterizer,
            page,
        })
    }

    /// Gemini for generation and the SVG rasterizer, both configured from
    /// `settings`.
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let generator = Gemini::new().with_model(settings.gemini_model.clone());
        let rasterizer = SvgRasterizer::new(
            settings.font_path.as_deref(),
            settings.font_family.as_deref(),
            settings.max_words,
        )?;
        Self::new(settings, Arc::new(generator), Arc::new(rasterizer))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}
