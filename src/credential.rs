use axum::http::HeaderMap;
use std::fmt;

pub const CREDENTIAL_HEADER: &str = "X-Gemini-API-Key";

/// A generation credential scoped to a single request.
#[derive(Clone)]
pub struct Credential(String);

impl Credential {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("Missing X-Gemini-API-Key header")]
    Missing,
}

/// Takes the credential from the request header, or from a server-side key
/// when one is configured. Correctness of the key is left to the upstream.
pub fn credential_from_headers(
    headers: &HeaderMap,
    server_key: Option<&str>,
) -> Result<Credential, CredentialError> {
    let header = headers
        .get(CREDENTIAL_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty());
    if let Some(value) = header {
        return Ok(Credential::new(value));
    }
    server_key
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(Credential::new)
        .ok_or(CredentialError::Missing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CREDENTIAL_HEADER, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn missing_header_is_rejected() {
        let err = credential_from_headers(&HeaderMap::new(), None).unwrap_err();
        assert_eq!(err.to_string(), "Missing X-Gemini-API-Key header");
    }

    #[test]
    fn blank_header_is_rejected() {
        assert!(credential_from_headers(&headers_with("   "), None).is_err());
    }

    #[test]
    fn header_wins_over_server_key() {
        let credential =
            credential_from_headers(&headers_with("request-key"), Some("server-key")).unwrap();
        assert_eq!(credential.expose(), "request-key");
    }

    #[test]
    fn server_key_fills_in_for_missing_header() {
        let credential = credential_from_headers(&HeaderMap::new(), Some("server-key")).unwrap();
        assert_eq!(credential.expose(), "server-key");
    }

    #[test]
    fn debug_output_hides_secret() {
        let credential = Credential::new("super-secret");
        assert!(!format!("{:?}", credential).contains("super-secret"));
    }
}
