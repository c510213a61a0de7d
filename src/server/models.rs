use serde::{Deserialize, Serialize};

use crate::render::{DEFAULT_PALETTE, Shape};

/// Requested verbosity of generated text. Accepted and logged only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Density {
    Concise,
    #[default]
    Default,
    Verbose,
}

impl Density {
    pub const ALL: [Density; 3] = [Density::Concise, Density::Default, Density::Verbose];

    pub fn as_str(&self) -> &'static str {
        match self {
            Density::Concise => "concise",
            Density::Default => "default",
            Density::Verbose => "verbose",
        }
    }
}

fn default_palette() -> String {
    DEFAULT_PALETTE.to_string()
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
    #[serde(default)]
    pub density: Density,
    #[serde(default)]
    pub exclude_words: Option<String>,
    #[serde(default)]
    pub shape: Shape,
    #[serde(default = "default_palette")]
    pub color_palette: String,
}

#[derive(Debug, Deserialize)]
pub struct RenderRequest {
    pub text: String,
    #[serde(default)]
    pub exclude_words: Option<String>,
    #[serde(default)]
    pub shape: Shape,
    #[serde(default = "default_palette")]
    pub color_palette: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RenderResponse {
    /// Base64 PNG.
    pub image: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub text: String,
    pub filename: String,
    pub file_size: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

#[derive(Debug, Serialize)]
pub struct OptionsResponse {
    pub credential_header: &'static str,
    pub shapes: Vec<&'static str>,
    pub default_shape: &'static str,
    pub densities: Vec<&'static str>,
    pub palettes: Vec<&'static str>,
    pub default_palette: &'static str,
    pub upload_extensions: Vec<&'static str>,
    pub max_upload_bytes: usize,
    pub tabular_row_limit: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_request_defaults() {
        let request: GenerateRequest = serde_json::from_str(r#"{"prompt":"rust"}"#).unwrap();
        assert_eq!(request.density, Density::Default);
        assert_eq!(request.shape, Shape::Rectangle);
        assert_eq!(request.color_palette, "viridis");
        assert!(request.exclude_words.is_none());
    }

    #[test]
    fn render_request_reads_every_field() {
        let request: RenderRequest = serde_json::from_str(
            r#"{"text":"a b","exclude_words":"a","shape":"sphere","color_palette":"plasma"}"#,
        )
        .unwrap();
        assert_eq!(request.shape, Shape::Sphere);
        assert_eq!(request.exclude_words.as_deref(), Some("a"));
        assert_eq!(request.color_palette, "plasma");
    }

    #[test]
    fn unknown_enum_values_are_rejected() {
        assert!(serde_json::from_str::<RenderRequest>(r#"{"text":"a","shape":"cube"}"#).is_err());
        assert!(
            serde_json::from_str::<GenerateRequest>(r#"{"prompt":"a","density":"huge"}"#).is_err()
        );
    }
}
