use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::multipart::{Field, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{HeaderMap, HeaderValue, Method, Request, Response, StatusCode, header};
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tracing::{debug, info};

use super::client::serve_page;
use super::error::ServerError;
use super::models::{
    Density, GenerateRequest, GenerateResponse, OptionsResponse, RenderRequest, RenderResponse,
    UploadResponse,
};
use super::state::AppState;
use crate::credential::{CREDENTIAL_HEADER, credential_from_headers};
use crate::data::UPLOAD_EXTENSIONS;
use crate::extract::{self, ExtractError, UploadedDocument};
use crate::normalize::normalize;
use crate::render::{DEFAULT_PALETTE, PALETTE_NAMES, Shape, build_render_spec, render_to_base64};

const UPLOAD_FIELD: &str = "file";
/// Room for multipart boundaries and part headers on top of the file limit.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state
        .settings
        .max_upload_bytes
        .saturating_add(MULTIPART_OVERHEAD_BYTES);
    let state = Arc::new(state);
    Router::new()
        .route("/health", get(health))
        .route("/options", get(options))
        .route("/generate", post(generate))
        .route("/render-image", post(render_image))
        .route(
            "/upload-file",
            post(upload_file).layer(DefaultBodyLimit::max(body_limit)),
        )
        .fallback(get(serve_page))
        .with_state(state)
        .layer(axum::middleware::from_fn(cors_middleware))
}

pub async fn run_server(state: AppState, addr: &str) -> Result<()> {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind server address: {}", addr))?;
    info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

async fn options(State(state): State<Arc<AppState>>) -> Json<OptionsResponse> {
    Json(OptionsResponse {
        credential_header: CREDENTIAL_HEADER,
        shapes: Shape::ALL.iter().map(Shape::as_str).collect(),
        default_shape: Shape::default().as_str(),
        densities: Density::ALL.iter().map(Density::as_str).collect(),
        palettes: PALETTE_NAMES.to_vec(),
        default_palette: DEFAULT_PALETTE,
        upload_extensions: UPLOAD_EXTENSIONS.to_vec(),
        max_upload_bytes: state.settings.max_upload_bytes,
        tabular_row_limit: state.settings.tabular_row_limit,
    })
}

async fn cors_middleware(req: Request<Body>, next: Next) -> Result<Response<Body>, StatusCode> {
    if req.method() == Method::OPTIONS {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;
        apply_cors_headers(response.headers_mut());
        return Ok(response);
    }
    let mut response = next.run(req).await;
    apply_cors_headers(response.headers_mut());
    Ok(response)
}

fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert("access-control-allow-origin", HeaderValue::from_static("*"));
    headers.insert(
        "access-control-allow-methods",
        HeaderValue::from_static("GET,POST,OPTIONS"),
    );
    headers.insert(
        "access-control-allow-headers",
        HeaderValue::from_static("content-type,authorization,x-gemini-api-key"),
    );
}

/// The body is checked before the credential, so a malformed request is a
/// 422 whether or not the header is present.
async fn generate(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, ServerError> {
    let Json(request) = payload?;
    if request.prompt.trim().is_empty() {
        return Err(ServerError::unprocessable("prompt must not be empty"));
    }
    let credential = credential_from_headers(&headers, state.settings.server_key())?;
    info!(
        "generate: prompt {} chars (density={}, shape={}, palette={})",
        request.prompt.chars().count(),
        request.density.as_str(),
        request.shape.as_str(),
        request.color_palette
    );
    let text = state
        .generator
        .generate(&request.prompt, &credential)
        .await?;
    debug!("generate: {} chars returned", text.chars().count());
    Ok(Json(GenerateResponse { text }))
}

async fn render_image(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RenderRequest>, JsonRejection>,
) -> Result<Json<RenderResponse>, ServerError> {
    let Json(request) = payload?;
    info!(
        "render-image: {} chars (shape={}, palette={}, exclude={})",
        request.text.chars().count(),
        request.shape.as_str(),
        request.color_palette,
        request.exclude_words.as_deref().unwrap_or("")
    );
    let corpus = normalize(&request.text, request.exclude_words.as_deref())?;
    let spec = build_render_spec(corpus, request.shape, &request.color_palette);
    let rasterizer = state.rasterizer.clone();
    let image =
        tokio::task::spawn_blocking(move || render_to_base64(&spec, rasterizer.as_ref())).await??;
    Ok(Json(RenderResponse { image }))
}

async fn upload_file(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ServerError> {
    let mut multipart = multipart?;
    let limits = state.settings.extract_limits();
    while let Some(mut field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let declared_size = field
            .headers()
            .get(header::CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<usize>().ok());
        info!(
            "upload-file: {} (content-type={})",
            filename,
            content_type.as_deref().unwrap_or("none")
        );
        extract::validate_declared(&filename, content_type.as_deref(), declared_size, &limits)?;

        let bytes = read_field_limited(&mut field, limits.max_bytes).await?;
        let document = UploadedDocument {
            bytes,
            filename,
            content_type,
        };
        let file_size = document.size();
        let (extracted, document) = tokio::task::spawn_blocking(move || {
            let extracted = extract::extract_text(&document, &limits);
            (extracted, document)
        })
        .await?;
        let extracted = extracted?;
        return Ok(Json(UploadResponse {
            text: extracted.text,
            filename: document.filename,
            file_size,
        }));
    }
    Err(ServerError::unprocessable(format!(
        "multipart field '{}' is required",
        UPLOAD_FIELD
    )))
}

async fn read_field_limited(field: &mut Field<'_>, limit: usize) -> Result<Vec<u8>, ServerError> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.chunk().await? {
        let size = bytes.len() + chunk.len();
        if size > limit {
            return Err(ExtractError::PayloadTooLarge { size, limit }.into());
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}
