use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use tower_cookies::Cookies;
use uuid::Uuid;

use crate::{error::AppError, state::AppState};

/// The session cookie name. Deliberately not a framework default.
pub const SESSION_COOKIE: &str = "gate_session";

/// Reads the session identifier out of the encrypted cookie jar.
///
/// A missing cookie, a cookie that fails the jar's authentication, and a
/// value that is not a UUID all come back as `None`; the gate treats them
/// identically.
fn extract_session_id(cookies: &Cookies, state: &AppState) -> Option<Uuid> {
    cookies
        .private(&state.config.cookie_key)
        .get(SESSION_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
}

/// The access-restriction gate.
///
/// Resolves the presented session identifier against the session store and
/// only then lets the request through, with the session attached as a
/// request extension for the downstream handler. No credential is
/// re-verified here; trust is rooted entirely in store membership.
pub async fn require_session(
    State(state): State<AppState>,
    cookies: Cookies,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let session_id = extract_session_id(&cookies, &state).ok_or(AppError::Unauthenticated)?;

    // Store `get` already treats expired records as absent.
    let session = state
        .sessions
        .get(session_id)
        .await?
        .ok_or(AppError::Unauthenticated)?;

    tracing::debug!("Session resolved for user: {}", session.user_id);

    request.extensions_mut().insert(session);

    Ok(next.run(request).await)
}
