use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::{Uri, header};
use axum::response::{Html, IntoResponse, Response};
use serde_json::json;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tera::{Context as TeraContext, Tera};

use super::error::ServerError;
use super::models::Density;
use super::state::AppState;
use crate::credential::CREDENTIAL_HEADER;
use crate::data::{self, UPLOAD_EXTENSIONS};
use crate::render::{DEFAULT_PALETTE, PALETTE_NAMES, Shape};
use crate::settings::Settings;

const PAGE_TEMPLATE: &str = include_str!("templates/index.html.tera");
const INDEX_FILE: &str = "index.html";

pub(crate) fn render_page(settings: &Settings) -> Result<String> {
    let config = json!({
        "credentialHeader": CREDENTIAL_HEADER,
        "maxUploadBytes": settings.max_upload_bytes,
    });
    let mut context = TeraContext::new();
    context.insert("config_json", &serde_json::to_string(&config)?);
    context.insert(
        "shapes",
        &Shape::ALL.iter().map(Shape::as_str).collect::<Vec<_>>(),
    );
    context.insert(
        "densities",
        &Density::ALL.iter().map(Density::as_str).collect::<Vec<_>>(),
    );
    context.insert("palettes", PALETTE_NAMES);
    context.insert("default_palette", DEFAULT_PALETTE);
    context.insert(
        "accept",
        &UPLOAD_EXTENSIONS
            .iter()
            .map(|ext| format!(".{}", ext))
            .collect::<Vec<_>>()
            .join(","),
    );
    context.insert("max_upload_mb", &(settings.max_upload_bytes / (1024 * 1024)));
    Tera::one_off(PAGE_TEMPLATE, &context, false).with_context(|| "failed to render page template")
}

/// Every GET that no API route claims. With `static_dir` configured the
/// directory is served with an `index.html` fallback, otherwise the embedded
/// page.
pub(crate) async fn serve_page(
    State(state): State<Arc<AppState>>,
    uri: Uri,
) -> Result<Response, ServerError> {
    match state.settings.static_dir.as_deref() {
        Some(root) => serve_static(root, uri.path()).await,
        None => Ok(Html(state.page.clone()).into_response()),
    }
}

async fn serve_static(root: &Path, request_path: &str) -> Result<Response, ServerError> {
    if let Some(relative) = safe_relative_path(request_path) {
        let candidate = root.join(relative);
        if tokio::fs::metadata(&candidate)
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false)
        {
            return read_file(&candidate).await;
        }
    }
    let index = root.join(INDEX_FILE);
    if !index.is_file() {
        return Err(ServerError::not_found(format!(
            "{} not found in {}",
            INDEX_FILE,
            root.display()
        )));
    }
    read_file(&index).await
}

async fn read_file(path: &Path) -> Result<Response, ServerError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|err| ServerError::internal(format!("failed to read {}: {}", path.display(), err)))?;
    Ok(([(header::CONTENT_TYPE, data::mime_from_path(path))], bytes).into_response())
}

/// Only plain path segments survive; anything that could climb out of the
/// root yields `None`.
fn safe_relative_path(request_path: &str) -> Option<PathBuf> {
    let trimmed = request_path.trim_start_matches('/');
    if trimmed.is_empty() {
        return None;
    }
    let mut relative = PathBuf::new();
    for component in Path::new(trimmed).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(relative)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_lists_options() {
        let page = render_page(&Settings::default()).unwrap();
        assert!(page.contains(r#"<option value="sphere">"#));
        assert!(page.contains(r#"<option value="Spectral">"#));
        assert!(page.contains("X-Gemini-API-Key"));
        assert!(page.contains(".txt,.csv,.tsv,.md,.log"));
    }

    #[test]
    fn traversal_is_refused() {
        assert_eq!(
            safe_relative_path("/assets/app.js"),
            Some(PathBuf::from("assets/app.js"))
        );
        assert_eq!(safe_relative_path("/"), None);
        assert_eq!(safe_relative_path("/../etc/passwd"), None);
        assert_eq!(safe_relative_path("/assets/../../secret"), None);
    }

    #[tokio::test]
    async fn static_dir_falls_back_to_index() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<p>app</p>").unwrap();
        std::fs::write(dir.path().join("app.js"), "console.log(1)").unwrap();

        let script = serve_static(dir.path(), "/app.js").await.unwrap();
        assert_eq!(script.headers()[header::CONTENT_TYPE], data::JS_MIME);

        let route = serve_static(dir.path(), "/some/client/route").await.unwrap();
        assert_eq!(route.headers()[header::CONTENT_TYPE], data::HTML_MIME);
    }

    #[tokio::test]
    async fn missing_index_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = serve_static(dir.path(), "/").await.unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::NOT_FOUND);
    }
}
