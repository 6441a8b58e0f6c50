pub mod auth;
pub mod cvs;
pub mod dashboard;
pub mod health;
pub mod users;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Auth
        .route("/api/v1/auth/login", post(auth::handle_login))
        .route("/api/v1/auth/logout", post(auth::handle_logout))
        .route("/api/v1/auth/me", get(auth::handle_me))
        .route("/api/v1/dashboard", get(dashboard::handle_dashboard))
        // CVs
        .route(
            "/api/v1/cvs",
            get(cvs::handle_list_cvs).post(cvs::handle_create_cv),
        )
        .route(
            "/api/v1/cvs/:id",
            get(cvs::handle_get_cv)
                .put(cvs::handle_update_cv)
                .delete(cvs::handle_delete_cv),
        )
        .route("/api/v1/cvs/:id/selection", get(cvs::handle_get_selection))
        .route(
            "/api/v1/cvs/:id/selection/toggle",
            post(cvs::handle_toggle_selection),
        )
        .route(
            "/api/v1/cvs/:id/selection/reset",
            post(cvs::handle_reset_selection),
        )
        .route("/api/v1/cvs/:id/skills", get(cvs::handle_filter_skills))
        .route("/api/v1/cvs/:id/document", get(cvs::handle_get_document))
        .route("/api/v1/cvs/:id/preview", get(cvs::handle_preview))
        .route("/api/v1/cvs/:id/export", get(cvs::handle_export))
        // User management (admin only)
        .route(
            "/api/v1/users",
            get(users::handle_list_users).post(users::handle_create_user),
        )
        .route(
            "/api/v1/users/:id",
            put(users::handle_update_user).delete(users::handle_delete_user),
        )
        .with_state(state)
}
