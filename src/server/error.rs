use axum::Json;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::warn;

use super::models::ErrorResponse;
use crate::credential::CredentialError;
use crate::extract::ExtractError;
use crate::normalize::NormalizeError;
use crate::providers::GenerateError;
use crate::render::RenderError;

/// A failed request: the status to answer with and the `detail` message.
#[derive(Debug)]
pub struct ServerError {
    pub status: StatusCode,
    pub message: String,
}

impl ServerError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        warn!("request failed ({}): {}", self.status, self.message);
        (
            self.status,
            Json(ErrorResponse {
                detail: self.message,
            }),
        )
            .into_response()
    }
}

impl From<CredentialError> for ServerError {
    fn from(err: CredentialError) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, err.to_string())
    }
}

impl From<GenerateError> for ServerError {
    fn from(err: GenerateError) -> Self {
        let status = match err {
            GenerateError::QuotaExceeded(_) => StatusCode::TOO_MANY_REQUESTS,
            GenerateError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            GenerateError::Failed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl From<ExtractError> for ServerError {
    fn from(err: ExtractError) -> Self {
        let status = match err {
            ExtractError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ExtractError::UnsupportedFileType { .. }
            | ExtractError::UnsupportedContentType { .. }
            | ExtractError::NoReadableContent { .. } => StatusCode::BAD_REQUEST,
        };
        Self::new(status, err.to_string())
    }
}

impl From<NormalizeError> for ServerError {
    fn from(err: NormalizeError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl From<RenderError> for ServerError {
    fn from(err: RenderError) -> Self {
        Self::internal(err.to_string())
    }
}

/// Every body rejection (syntax, schema, missing content type) is a 422.
impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        Self::unprocessable(rejection.body_text())
    }
}

impl From<MultipartRejection> for ServerError {
    fn from(rejection: MultipartRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl From<MultipartError> for ServerError {
    fn from(err: MultipartError) -> Self {
        Self::new(err.status(), err.body_text())
    }
}

impl From<tokio::task::JoinError> for ServerError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::internal(format!("server task failed: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_failures_keep_their_status() {
        let cases = [
            (
                GenerateError::QuotaExceeded("slow down".into()),
                StatusCode::TOO_MANY_REQUESTS,
            ),
            (
                GenerateError::Unauthorized("bad key".into()),
                StatusCode::UNAUTHORIZED,
            ),
            (
                GenerateError::Failed("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ServerError::from(err).status, status);
        }
    }

    #[test]
    fn extraction_failures_are_client_errors() {
        let too_large = ServerError::from(ExtractError::PayloadTooLarge { size: 2, limit: 1 });
        assert_eq!(too_large.status, StatusCode::PAYLOAD_TOO_LARGE);
        let bad_type = ServerError::from(ExtractError::UnsupportedFileType {
            filename: "x.exe".into(),
        });
        assert_eq!(bad_type.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn missing_credential_names_the_header() {
        let err = ServerError::from(CredentialError::Missing);
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        assert_eq!(err.message, "Missing X-Gemini-API-Key header");
    }

    #[test]
    fn empty_corpus_and_render_failures() {
        assert_eq!(
            ServerError::from(NormalizeError::EmptyCorpus).status,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServerError::from(RenderError::UnknownPalette("nope".into())).status,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
