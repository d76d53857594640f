use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tower_cookies::cookie::time::Duration;
use tower_cookies::{Cookie, Cookies};
use uuid::Uuid;

use crate::{
    error::Result,
    middleware_layer::auth::SESSION_COOKIE,
    models::session::Session,
    models::user::AccountView,
    services::auth as auth_service,
    state::AppState,
    validation::auth::*,
};

/// The request payload for user registration and login.
#[derive(Deserialize, Debug)]
pub struct CredentialsRequest {
    pub username: String,
    // Plaintext for the duration of the request only; never logged.
    pub password: String,
}

/// The response payload for authentication-related requests.
#[derive(Serialize)]
pub struct AuthResponse {
    pub message: String,
}

/// Builds the session cookie. `HttpOnly` always, `Secure` in production,
/// `Max-Age` bounded by the session TTL.
fn build_session_cookie(session_id: Uuid, state: &AppState) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, session_id.to_string());

    cookie.set_http_only(true);
    if state.config.is_production() {
        cookie.set_secure(true);
    }
    cookie.set_same_site(tower_cookies::cookie::SameSite::Lax);
    cookie.set_max_age(Duration::seconds(state.config.session_ttl_secs as i64));
    cookie.set_path("/");

    cookie
}

/// Handles user registration. Hashes the password and persists the account;
/// does not log the user in.
#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<impl IntoResponse> {
    tracing::info!("Register attempt for username: {}", payload.username);
    validate_username(&payload.username)?;
    validate_password(&payload.password)?;

    let user = auth_service::create_user(&state.db, &payload.username, payload.password).await?;

    tracing::info!("User registered: {}", user.id);

    Ok((StatusCode::CREATED, Json(AccountView::from(user))).into_response())
}

/// Handles user login. On success a session is persisted and its identifier
/// set as an encrypted cookie; on failure the client learns nothing beyond
/// the generic 401.
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<CredentialsRequest>,
) -> Result<Response> {
    tracing::info!("Login attempt for username: {}", payload.username);

    let user =
        auth_service::authenticate_user(&state.db, &payload.username, payload.password).await?;

    let session = Session::new(user.id, user.username.clone(), state.config.session_ttl_secs);
    let session_id = state.sessions.create(&session).await?;

    cookies
        .private(&state.config.cookie_key)
        .add(build_session_cookie(session_id, &state));

    tracing::info!("User logged in: {}", user.id);

    let response = AuthResponse {
        message: format!("Welcome {}!", user.username),
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Handles logout. Idempotent: destroying a session that no longer exists
/// (or never did) is still a 200.
#[axum::debug_handler]
pub async fn logout(
    State(state): State<AppState>,
    cookies: Cookies,
) -> Result<Response> {
    let session_id = cookies
        .private(&state.config.cookie_key)
        .get(SESSION_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok());

    if let Some(session_id) = session_id {
        state.sessions.destroy(session_id).await?;
        tracing::info!("Session destroyed: {}", session_id);
    }

    let mut session_cookie = Cookie::new(SESSION_COOKIE, "");
    session_cookie.set_max_age(Duration::seconds(0));
    session_cookie.set_path("/");
    cookies.remove(session_cookie);

    let response = AuthResponse {
        message: "Logged out".to_string(),
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}
