use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose, Engine as _};
use serde::Deserialize;
use tracing::warn;

use crate::web::state::AppState;

/// The viewer every protected handler acts on behalf of.
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub id: String,
}

#[derive(Deserialize)]
struct JwtPayload {
    sub: String,
}

/// Reads the `sub` claim of the `access_token` cookie. The signature is
/// checked upstream by the identity service, not here.
fn viewer_from_cookie(cookies: &str) -> Option<String> {
    let token = cookies
        .split(';')
        .map(str::trim)
        .find_map(|c| c.strip_prefix("access_token="))?;

    let mut parts = token.split('.');
    let (_header, payload, _sig) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let bytes = general_purpose::URL_SAFE_NO_PAD.decode(payload).ok()?;
    let payload: JwtPayload = serde_json::from_slice(&bytes).ok()?;
    let sub = payload.sub.trim();
    (!sub.is_empty()).then(|| sub.to_string())
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let from_cookie = request
        .headers()
        .get(header::COOKIE)
        .and_then(|hv| hv.to_str().ok())
        .and_then(viewer_from_cookie);

    if let Some(id) = from_cookie {
        request.extensions_mut().insert(AuthenticatedUser { id });
        return next.run(request).await;
    }

    // Offline/local usage: fall back to the current_user table
    match state.store.local_viewer_id().await {
        Ok(Some(id)) => {
            request.extensions_mut().insert(AuthenticatedUser { id });
            next.run(request).await
        }
        Ok(None) => (StatusCode::UNAUTHORIZED, "Unauthorized - Please login").into_response(),
        Err(e) => {
            warn!("🔐 Local viewer lookup failed: {}", e);
            (StatusCode::UNAUTHORIZED, "Unauthorized - Please login").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_for(sub: &str) -> String {
        let payload = general_purpose::URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"{}"}}"#, sub));
        format!("eyJhbGciOiJIUzI1NiJ9.{}.sig", payload)
    }

    #[test]
    fn sub_is_read_from_access_token_cookie() {
        let cookies = format!("theme=dark; access_token={}; other=1", token_for("user-7"));
        assert_eq!(viewer_from_cookie(&cookies), Some("user-7".to_string()));
    }

    #[test]
    fn malformed_tokens_are_ignored() {
        assert_eq!(viewer_from_cookie("access_token=not-a-jwt"), None);
        assert_eq!(viewer_from_cookie("access_token=a.!!!.c"), None);
        assert_eq!(viewer_from_cookie("session=abc"), None);
        assert_eq!(viewer_from_cookie(&format!("access_token={}", token_for(" "))), None);
    }
}
