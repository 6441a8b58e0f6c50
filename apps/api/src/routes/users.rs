use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::auth::guard::AdminSession;
use crate::errors::AppError;
use crate::models::user::{PublicUser, Role, UserPatch};
use crate::state::AppState;
use crate::store::FetchStatus;
use crate::validation::user_form::{validate_user_form, validate_user_patch, UserForm};

#[derive(Serialize)]
pub struct UserListResponse {
    pub items: Vec<PublicUser>,
    pub status: FetchStatus,
    pub error: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDeletedResponse {
    pub id: String,
    pub cvs_deleted: usize,
    pub sessions_closed: usize,
}

/// GET /api/v1/users
pub async fn handle_list_users(
    State(state): State<AppState>,
    _admin: AdminSession,
) -> Json<UserListResponse> {
    let users = state.store.fetch_users().await;
    Json(UserListResponse {
        items: users.items.iter().map(PublicUser::from).collect(),
        status: users.status,
        error: users.error,
    })
}

/// POST /api/v1/users
pub async fn handle_create_user(
    State(state): State<AppState>,
    _admin: AdminSession,
    Json(form): Json<UserForm>,
) -> Result<(StatusCode, Json<PublicUser>), AppError> {
    let validation = validate_user_form(&form);
    if !validation.is_valid {
        return Err(AppError::invalid_form(&validation));
    }
    let new_user = form
        .into_new_user()
        .ok_or_else(|| AppError::Validation("Role must be either \"admin\" or \"user\"".to_string()))?;
    let user = state.store.create_user(new_user).await?;
    Ok((StatusCode::CREATED, Json(PublicUser::from(&user))))
}

/// PUT /api/v1/users/:id
pub async fn handle_update_user(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(id): Path<String>,
    Json(patch): Json<UserPatch>,
) -> Result<Json<PublicUser>, AppError> {
    let validation = validate_user_patch(&patch);
    if !validation.is_valid {
        return Err(AppError::invalid_form(&validation));
    }
    let target = state.store.find_user(&id).await?;
    if target.is_reserved_admin() && patch.role.is_some_and(|role| role != Role::Admin) {
        return Err(AppError::Validation(
            "The admin account must keep the admin role".to_string(),
        ));
    }

    let user = PublicUser::from(&state.store.update_user(&id, patch).await?);
    state.sessions.refresh_user(&user).await;
    Ok(Json(user))
}

/// DELETE /api/v1/users/:id
/// Removes every CV whose `userId` is this user, then the user. A failed CV
/// removal leaves the user in place so the request can be retried.
pub async fn handle_delete_user(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(id): Path<String>,
) -> Result<Json<UserDeletedResponse>, AppError> {
    let target = state.store.find_user(&id).await?;
    if target.is_reserved_admin() {
        return Err(AppError::Validation(
            "The admin account cannot be deleted".to_string(),
        ));
    }

    let cvs_deleted = state.store.delete_cvs_owned_by(&id).await?;
    state.store.delete_user(&id).await?;
    let sessions_closed = state.sessions.close_user(&id).await;
    info!("User {id} removed with {cvs_deleted} CVs");
    Ok(Json(UserDeletedResponse {
        id,
        cvs_deleted,
        sessions_closed,
    }))
}
