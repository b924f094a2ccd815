//! Internal error helpers for mapping HTTP/reqwest errors to [`ProviderError`].

use parley_provider::ProviderError;

use crate::types::GenerateContentResponse;

/// Map an HTTP status code (from the Gemini API) to a [`ProviderError`].
///
/// Reference: <https://ai.google.dev/gemini-api/docs/troubleshooting>
pub(crate) fn map_http_status(status: reqwest::StatusCode, body: &str) -> ProviderError {
    let detail = error_message(body).unwrap_or_else(|| body.to_string());
    match status.as_u16() {
        401 | 403 => ProviderError::AuthFailed(detail),
        429 => ProviderError::RateLimited,
        400 | 404 => ProviderError::RequestFailed(format!("HTTP {status}: {detail}")),
        500..=599 => {
            ProviderError::RequestFailed(format!("service unavailable ({status}): {detail}"))
        }
        _ => ProviderError::InvalidResponse(format!("HTTP {status}: {detail}")),
    }
}

/// Pull `error.message` out of a Gemini error body, if it is one.
fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<GenerateContentResponse>(body)
        .ok()
        .and_then(|r| r.error)
        .map(|e| e.message)
        .filter(|m| !m.is_empty())
}

/// Map a [`reqwest::Error`] to a [`ProviderError`].
pub(crate) fn map_reqwest_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::RequestFailed(format!("timed out: {err}"))
    } else {
        ProviderError::RequestFailed(err.to_string())
    }
}
