//! services/api/src/web/middleware.rs
//!
//! Identity middleware for protecting routes.
//!
//! Authentication itself happens upstream: the identity provider in front of
//! this service forwards the authenticated user's id in the `x-user-id` header.

use axum::{
    extract::Request,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use tracing::warn;
use uuid::Uuid;

/// Header carrying the user id asserted by the identity provider.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Parses the forwarded user id, if present and well formed.
pub fn user_id_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v.trim()).ok())
}

/// Middleware that requires a forwarded identity and exposes the user_id.
///
/// If valid, inserts the user_id into request extensions for handlers to use.
/// If invalid or missing, returns 401 Unauthorized.
pub async fn require_identity(mut req: Request, next: Next) -> Result<Response, StatusCode> {
    let user_id = user_id_from_headers(req.headers()).ok_or_else(|| {
        warn!("Rejected request to {} without a valid identity", req.uri().path());
        StatusCode::UNAUTHORIZED
    })?;

    req.extensions_mut().insert(user_id);

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn forwarded_user_id_is_parsed() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_str(&id.to_string()).unwrap());
        assert_eq!(user_id_from_headers(&headers), Some(id));
    }

    #[test]
    fn malformed_user_id_is_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("admin"));
        assert_eq!(user_id_from_headers(&headers), None);
    }
}
