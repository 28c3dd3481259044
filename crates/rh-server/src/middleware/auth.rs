//! Admin authorization middleware.
//!
//! Mutating routes sit behind [`require_admin`], which runs the
//! [`AccessGate`](crate::gate::AccessGate) on the caller's credentials and
//! inserts the resulting [`AdminGrant`](crate::gate::AdminGrant) into request
//! extensions. Handlers take the grant with `Extension<AdminGrant>` and pass
//! it on to the catalog.

use axum::extract::State;
use axum::http::{header, HeaderMap, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;

use crate::context::AppContext;
use crate::error::AppError;

/// Cookie name for browser sessions.
pub const SESSION_COOKIE: &str = "reelhouse_session";

/// Extract a bearer token or session cookie from request headers.
///
/// `Authorization: Bearer <token>` wins over the `reelhouse_session` cookie.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth) = headers.get(header::AUTHORIZATION) {
        if let Ok(val) = auth.to_str() {
            if let Some(token) = val.strip_prefix("Bearer ") {
                let token = token.trim();
                if !token.is_empty() {
                    return Some(token.to_string());
                }
            }
        }
    }

    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

/// Reject the request unless the caller holds an admin grant.
pub async fn require_admin(
    State(ctx): State<AppContext>,
    mut request: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let token = extract_token(request.headers());

    match ctx.gate().authorize(token.as_deref()) {
        Ok(grant) => {
            request.extensions_mut().insert(grant);
            next.run(request).await
        }
        Err(e) => {
            tracing::debug!(
                path = %request.uri().path(),
                error = %e,
                "Admin check failed"
            );
            AppError::from(e).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(extract_token(&headers).as_deref(), Some("abc"));
    }

    #[test]
    fn session_cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; reelhouse_session=tok123; lang=en"),
        );
        assert_eq!(extract_token(&headers).as_deref(), Some("tok123"));
    }

    #[test]
    fn session_cookie_in_second_header() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(header::COOKIE, HeaderValue::from_static("reelhouse_session=tok456"));
        assert_eq!(extract_token(&headers).as_deref(), Some("tok456"));
    }

    #[test]
    fn bearer_beats_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer first"));
        headers.insert(header::COOKIE, HeaderValue::from_static("reelhouse_session=second"));
        assert_eq!(extract_token(&headers).as_deref(), Some("first"));
    }

    #[test]
    fn no_credentials() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic xyz"));
        headers.insert(header::COOKIE, HeaderValue::from_static("reelhouse_session="));
        assert_eq!(extract_token(&headers), None);
    }
}
