use axum::http::HeaderMap;

use crate::error::ApiError;

pub mod health;
pub mod subtasks;
pub mod tasks;
pub mod users;

pub const ACTOR_HEADER: &str = "x-user-id";

/// Mutating task endpoints identify the acting user through the
/// `X-User-Id` header.
pub(crate) fn actor_id(headers: &HeaderMap) -> Result<i64, ApiError> {
    let raw = headers
        .get(ACTOR_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::BadRequest("X-User-Id header is required".to_string()))?;
    raw.trim()
        .parse()
        .map_err(|_| ApiError::BadRequest("X-User-Id header must be a user id".to_string()))
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn actor_id_parses_numeric_header() {
        let mut headers = HeaderMap::new();
        headers.insert(ACTOR_HEADER, HeaderValue::from_static("42"));
        assert_eq!(actor_id(&headers).unwrap(), 42);
    }

    #[test]
    fn actor_id_rejects_missing_or_garbage_header() {
        let headers = HeaderMap::new();
        assert!(actor_id(&headers).is_err());

        let mut headers = HeaderMap::new();
        headers.insert(ACTOR_HEADER, HeaderValue::from_static("not-a-number"));
        assert!(actor_id(&headers).is_err());
    }
}
