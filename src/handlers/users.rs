use axum::{extract::State, Extension, Json};

use crate::{
    error::Result,
    models::session::Session,
    models::user::AccountView,
    repositories::user as user_repo,
    state::AppState,
};

/// Lists all accounts. Gated: only reachable through `require_session`,
/// which attaches the caller's session as an extension.
#[axum::debug_handler]
pub async fn list_users(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<AccountView>>> {
    tracing::debug!("Listing users for: {}", session.username);

    let users = user_repo::list_users(&state.db).await?;
    Ok(Json(users))
}
