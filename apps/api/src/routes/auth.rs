use axum::{extract::State, Json};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::guard::CurrentSession;
use crate::auth::{login, AuthState};
use crate::errors::AppError;
use crate::models::user::PublicUser;
use crate::state::AppState;
use crate::validation::user_form::LoginForm;

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: Uuid,
    pub user: PublicUser,
}

/// POST /api/v1/auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    Json(form): Json<LoginForm>,
) -> Result<Json<LoginResponse>, AppError> {
    let user = login(&state.store, &form).await?;
    let token = state.sessions.open(user.clone()).await;
    Ok(Json(LoginResponse { token, user }))
}

/// POST /api/v1/auth/logout
pub async fn handle_logout(
    State(state): State<AppState>,
    session: CurrentSession,
) -> Result<Json<AuthState>, AppError> {
    let auth = state
        .sessions
        .close(session.token)
        .await
        .ok_or(AppError::Unauthorized)?;
    Ok(Json(auth))
}

/// GET /api/v1/auth/me
pub async fn handle_me(session: CurrentSession) -> Json<PublicUser> {
    Json(session.user)
}
