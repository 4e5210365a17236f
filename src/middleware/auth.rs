use crate::error::AppError;
use crate::handlers::auth::verify_session_token;
use crate::models::auth::Claims;
use crate::AppState;
use axum::{
    extract::{Extension, Request},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

pub const SESSION_COOKIE: &str = "session";

/// Session token from `Authorization: Bearer <token>`, falling back to the session cookie
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
}

/// Verified claims for the request, if it carries a valid session
pub fn claims_from_headers(headers: &HeaderMap, secret: &str) -> Option<Claims> {
    let token = session_token(headers)?;
    match verify_session_token(&token, secret) {
        Ok(claims) if claims.user_id().is_some() => Some(claims),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!("Session verification failed: {}", e);
            None
        }
    }
}

pub async fn auth_middleware(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = claims_from_headers(&headers, &state.config.session_secret)
        .ok_or(AppError::Unauthorized("Unauthorized"))?;

    // Handlers read the caller through Extension<Claims>
    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::auth::issue_session_token;
    use axum::http::HeaderValue;

    const SECRET: &str = "test-secret";

    fn headers(name: header::HeaderName, value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(name, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_preferred() {
        let mut map = headers(header::AUTHORIZATION, "Bearer abc.def.ghi");
        map.insert(header::COOKIE, HeaderValue::from_static("session=cookie-token"));
        assert_eq!(session_token(&map).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_cookie_token() {
        let map = headers(header::COOKIE, "theme=dark; session=cookie-token");
        assert_eq!(session_token(&map).as_deref(), Some("cookie-token"));
        assert_eq!(session_token(&HeaderMap::new()), None);
        assert_eq!(session_token(&headers(header::AUTHORIZATION, "Basic dXNlcg==")), None);
    }

    #[test]
    fn test_claims_from_headers() {
        let token = issue_session_token(42, "Ada", "ada@example.com", SECRET).unwrap();
        let map = headers(header::AUTHORIZATION, &format!("Bearer {}", token));

        let claims = claims_from_headers(&map, SECRET).unwrap();
        assert_eq!(claims.user_id(), Some(42));
        assert!(claims_from_headers(&map, "other-secret").is_none());
    }
}
