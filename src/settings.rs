use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::credential::Credential;
use crate::extract::{DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_TABULAR_ROW_LIMIT, ExtractLimits};
use crate::providers::DEFAULT_MODEL;
use crate::render::DEFAULT_MAX_WORDS;

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");
pub const DEFAULT_ADDR: &str = "127.0.0.1:8000";

#[derive(Debug, Clone)]
pub struct Settings {
    pub server_addr: String,
    pub static_dir: Option<PathBuf>,
    pub max_upload_bytes: usize,
    pub tabular_row_limit: usize,
    pub gemini_model: String,
    pub gemini_api_key: Option<Credential>,
    pub server_key_fallback: bool,
    pub font_path: Option<PathBuf>,
    pub font_family: Option<String>,
    pub max_words: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_addr: DEFAULT_ADDR.to_string(),
            static_dir: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            tabular_row_limit: DEFAULT_TABULAR_ROW_LIMIT,
            gemini_model: DEFAULT_MODEL.to_string(),
            gemini_api_key: None,
            server_key_fallback: false,
            font_path: None,
            font_family: None,
            max_words: DEFAULT_MAX_WORDS,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    server: Option<ServerSettings>,
    upload: Option<UploadSettings>,
    gemini: Option<GeminiSettings>,
    render: Option<RenderSettings>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerSettings {
    addr: Option<String>,
    static_dir: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct UploadSettings {
    max_bytes: Option<usize>,
    tabular_row_limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct GeminiSettings {
    model: Option<String>,
    api_key: Option<String>,
    server_key_fallback: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct RenderSettings {
    max_words: Option<usize>,
    font_path: Option<String>,
    font_family: Option<String>,
}

/// Embedded defaults, then `settings.toml` and `settings.local.toml` in the
/// working directory, then `extra_path`. Later files win per key.
pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::default();
    let defaults: SettingsFile =
        toml::from_str(DEFAULT_SETTINGS_TOML).with_context(|| "failed to parse default settings")?;
    settings.merge(defaults);

    let mut ordered_paths = vec![
        PathBuf::from("settings.toml"),
        PathBuf::from("settings.local.toml"),
    ];
    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }

    for path in ordered_paths {
        if path.exists() {
            settings.merge_file(&path)?;
        }
    }

    if settings.server_key_fallback && settings.gemini_api_key.is_none() {
        settings.gemini_api_key = get_env("GEMINI_API_KEY")
            .or_else(|| get_env("GOOGLE_API_KEY"))
            .map(Credential::new);
    }
    Ok(settings)
}

impl Settings {
    pub fn extract_limits(&self) -> ExtractLimits {
        ExtractLimits {
            max_bytes: self.max_upload_bytes,
            tabular_row_limit: self.tabular_row_limit,
        }
    }

    /// The server-side credential, when the deployment opted into one.
    pub fn server_key(&self) -> Option<&str> {
        if !self.server_key_fallback {
            return None;
        }
        self.gemini_api_key.as_ref().map(Credential::expose)
    }

    pub fn merge_file(&mut self, path: &Path) -> Result<()> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings: {}", path.display()))?;
        let parsed: SettingsFile = toml::from_str(&content)
            .with_context(|| format!("failed to parse settings: {}", path.display()))?;
        self.merge(parsed);
        Ok(())
    }

    fn merge(&mut self, incoming: SettingsFile) {
        if let Some(server) = incoming.server {
            if let Some(addr) = non_blank(server.addr) {
                self.server_addr = addr;
            }
            if let Some(dir) = non_blank(server.static_dir) {
                self.static_dir = Some(PathBuf::from(dir));
            }
        }
        if let Some(upload) = incoming.upload {
            if let Some(limit) = upload.max_bytes.filter(|value| *value > 0) {
                self.max_upload_bytes = limit;
            }
            if let Some(limit) = upload.tabular_row_limit {
                self.tabular_row_limit = limit;
            }
        }
        if let Some(gemini) = incoming.gemini {
            if let Some(model) = non_blank(gemini.model) {
                self.gemini_model = model;
            }
            if let Some(key) = non_blank(gemini.api_key) {
                self.gemini_api_key = Some(Credential::new(key));
            }
            if let Some(enabled) = gemini.server_key_fallback {
                self.server_key_fallback = enabled;
            }
        }
        if let Some(render) = incoming.render {
            if let Some(max_words) = render.max_words.filter(|value| *value > 0) {
                self.max_words = max_words;
            }
            if let Some(path) = non_blank(render.font_path) {
                self.font_path = Some(PathBuf::from(path));
            }
            if let Some(family) = non_blank(render.font_family) {
                self.font_family = Some(family);
            }
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn get_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
}
