//! Users and API tokens.

use crate::api::{
    AppState,
    types::{ApiResult, Created, created},
};
use axum::{Extension, Json, extract::State};
use conforma_core::{Actor, IssuedToken, NewUser, User};

/// `POST /api/auth/register` - ADMIN creates a user and receives its token.
pub async fn register(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(input): Json<NewUser>,
) -> Created<IssuedToken> {
    created(state.store.lock().await.register_user(&actor, &input)?)
}

/// `GET /api/auth/me`
pub async fn me(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<Json<User>> {
    Ok(Json(state.store.lock().await.current_user(&actor)?))
}

/// `POST /api/auth/token` - replace the caller's token.
pub async fn rotate_token(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<Json<IssuedToken>> {
    Ok(Json(state.store.lock().await.rotate_token(&actor)?))
}

/// `GET /api/usuarios`
pub async fn list(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(state.store.lock().await.list_users(&actor)?))
}
