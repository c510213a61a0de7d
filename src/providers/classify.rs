use reqwest::StatusCode;

use super::GenerateError;

pub(crate) fn is_rate_limited(status: StatusCode, body: &str) -> bool {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return true;
    }
    let lower = body.to_lowercase();
    lower.contains("rate limit")
        || lower.contains("rate_limit")
        || lower.contains("too many requests")
        || lower.contains("resource_exhausted")
        || lower.contains("quota")
}

pub(crate) fn is_unauthorized(status: StatusCode, body: &str) -> bool {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return true;
    }
    let lower = body.to_lowercase();
    lower.contains("api_key_invalid")
        || lower.contains("api key not valid")
        || lower.contains("permission_denied")
        || lower.contains("unauthenticated")
}

/// Maps a failed upstream response to a stable outcome. `body` is the raw
/// response text, `message` the condensed form reported to the caller.
pub(crate) fn classify_failure(status: StatusCode, body: &str, message: String) -> GenerateError {
    if is_rate_limited(status, body) {
        GenerateError::QuotaExceeded(message)
    } else if is_unauthorized(status, body) {
        GenerateError::Unauthorized(message)
    } else {
        GenerateError::Failed(format!("{} ({})", message, status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_by_status_or_body() {
        assert!(is_rate_limited(StatusCode::TOO_MANY_REQUESTS, ""));
        assert!(is_rate_limited(
            StatusCode::BAD_REQUEST,
            r#"{"error":{"status":"RESOURCE_EXHAUSTED"}}"#
        ));
        assert!(!is_rate_limited(StatusCode::SERVICE_UNAVAILABLE, "overloaded"));
    }

    #[test]
    fn invalid_key_reported_as_bad_request_is_unauthorized() {
        let body = r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT","details":[{"reason":"API_KEY_INVALID"}]}}"#;
        let err = classify_failure(StatusCode::BAD_REQUEST, body, "API key not valid".into());
        assert!(matches!(err, GenerateError::Unauthorized(_)));
    }

    #[test]
    fn forbidden_is_unauthorized() {
        let err = classify_failure(StatusCode::FORBIDDEN, "", "denied".into());
        assert!(matches!(err, GenerateError::Unauthorized(_)));
    }

    #[test]
    fn everything_else_is_a_failure_with_status() {
        let err = classify_failure(StatusCode::INTERNAL_SERVER_ERROR, "boom", "boom".into());
        match err {
            GenerateError::Failed(message) => {
                assert_eq!(message, "boom (500 Internal Server Error)")
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }
}
