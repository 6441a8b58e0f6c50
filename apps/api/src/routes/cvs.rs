use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::auth::guard::CurrentSession;
use crate::compose::{compose, render, Artifact, DocumentModel, RenderTarget};
use crate::errors::AppError;
use crate::models::cv::{Cv, CvDraft, CvPatch};
use crate::selection::{filter_skills, EntryKind, EntryRef, ReconcilePolicy, SelectionState};
use crate::state::AppState;
use crate::store::FetchStatus;
use crate::validation::cv_form::validate_cv_form;

#[derive(Serialize)]
pub struct CvListResponse {
    pub items: Vec<Cv>,
    pub status: FetchStatus,
    pub error: Option<String>,
}

/// `?policy=reseed|preserve`. When absent the session's remembered policy applies.
#[derive(Debug, Default, Deserialize)]
pub struct SelectionQuery {
    #[serde(default)]
    pub policy: Option<ReconcilePolicy>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SkillQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub policy: Option<ReconcilePolicy>,
}

#[derive(Serialize)]
pub struct SkillMatch {
    pub index: usize,
    pub skill: String,
    pub selected: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleResponse {
    pub selected: bool,
    pub selection: SelectionState,
}

/// Loads a CV the session may read. CVs the user cannot see are reported as
/// missing.
async fn readable_cv(state: &AppState, session: &CurrentSession, id: &str) -> Result<Cv, AppError> {
    let cv = state.store.find_cv(id).await?;
    if !cv.is_visible_to(&session.user) {
        return Err(AppError::NotFound(format!("CV {id} not found")));
    }
    Ok(cv)
}

/// Loads a CV the session may change: admins change any CV, users their own.
async fn writable_cv(state: &AppState, session: &CurrentSession, id: &str) -> Result<Cv, AppError> {
    let cv = readable_cv(state, session, id).await?;
    let owns = session.user.id.as_deref() == Some(cv.user_id.as_str());
    if !session.is_admin() && !owns {
        return Err(AppError::Forbidden);
    }
    Ok(cv)
}

async fn current_selection(
    state: &AppState,
    session: &CurrentSession,
    cv: &Cv,
    policy: Option<ReconcilePolicy>,
) -> Result<SelectionState, AppError> {
    state
        .sessions
        .with_selection(session.token, cv, policy, |s| s.clone())
        .await
        .ok_or(AppError::Unauthorized)
}

/// GET /api/v1/cvs
pub async fn handle_list_cvs(
    State(state): State<AppState>,
    session: CurrentSession,
) -> Json<CvListResponse> {
    let cvs = state.store.fetch_cvs().await;
    let items = cvs
        .items
        .into_iter()
        .filter(|cv| cv.is_visible_to(&session.user))
        .collect();
    Json(CvListResponse {
        items,
        status: cvs.status,
        error: cvs.error,
    })
}

/// POST /api/v1/cvs
pub async fn handle_create_cv(
    State(state): State<AppState>,
    session: CurrentSession,
    Json(draft): Json<CvDraft>,
) -> Result<(StatusCode, Json<Cv>), AppError> {
    let validation = validate_cv_form(&draft);
    if !validation.is_valid {
        return Err(AppError::invalid_form(&validation));
    }
    let owner = session
        .user
        .id
        .as_deref()
        .ok_or(AppError::Unauthorized)?;
    let cv = state.store.create_cv(owner, draft).await?;
    Ok((StatusCode::CREATED, Json(cv)))
}

/// GET /api/v1/cvs/:id
pub async fn handle_get_cv(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(id): Path<String>,
) -> Result<Json<Cv>, AppError> {
    Ok(Json(readable_cv(&state, &session, &id).await?))
}

/// PUT /api/v1/cvs/:id
pub async fn handle_update_cv(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(id): Path<String>,
    Json(patch): Json<CvPatch>,
) -> Result<Json<Cv>, AppError> {
    let cv = writable_cv(&state, &session, &id).await?;
    let validation = validate_cv_form(&cv.merged_with(&patch));
    if !validation.is_valid {
        return Err(AppError::invalid_form(&validation));
    }
    Ok(Json(state.store.update_cv(&id, patch).await?))
}

/// DELETE /api/v1/cvs/:id
pub async fn handle_delete_cv(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    writable_cv(&state, &session, &id).await?;
    state.store.delete_cv(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/cvs/:id/selection
pub async fn handle_get_selection(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(id): Path<String>,
    Query(query): Query<SelectionQuery>,
) -> Result<Json<SelectionState>, AppError> {
    let cv = readable_cv(&state, &session, &id).await?;
    Ok(Json(current_selection(&state, &session, &cv, query.policy).await?))
}

/// POST /api/v1/cvs/:id/selection/toggle
pub async fn handle_toggle_selection(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(id): Path<String>,
    Query(query): Query<SelectionQuery>,
    Json(entry): Json<EntryRef>,
) -> Result<Json<ToggleResponse>, AppError> {
    let cv = readable_cv(&state, &session, &id).await?;
    let (selected, selection) = state
        .sessions
        .with_selection(session.token, &cv, query.policy, |s| {
            s.toggle(&cv, entry).map(|selected| (selected, s.clone()))
        })
        .await
        .ok_or(AppError::Unauthorized)??;
    Ok(Json(ToggleResponse {
        selected,
        selection,
    }))
}

/// POST /api/v1/cvs/:id/selection/reset
pub async fn handle_reset_selection(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(id): Path<String>,
) -> Result<Json<SelectionState>, AppError> {
    let cv = readable_cv(&state, &session, &id).await?;
    let selection = state
        .sessions
        .with_selection(session.token, &cv, None, |s| {
            s.reset(&cv);
            s.clone()
        })
        .await
        .ok_or(AppError::Unauthorized)?;
    Ok(Json(selection))
}

/// GET /api/v1/cvs/:id/skills?q=&policy=
pub async fn handle_filter_skills(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(id): Path<String>,
    Query(query): Query<SkillQuery>,
) -> Result<Json<Vec<SkillMatch>>, AppError> {
    let cv = readable_cv(&state, &session, &id).await?;
    let selection = current_selection(&state, &session, &cv, query.policy).await?;
    let matches = filter_skills(&cv, &query.q)
        .into_iter()
        .map(|(index, skill)| SkillMatch {
            index,
            skill: skill.to_string(),
            selected: selection.set.contains(EntryKind::Skills, index),
        })
        .collect();
    Ok(Json(matches))
}

async fn document_for(
    state: &AppState,
    session: &CurrentSession,
    id: &str,
    policy: Option<ReconcilePolicy>,
) -> Result<DocumentModel, AppError> {
    let cv = readable_cv(state, session, id).await?;
    let selection = current_selection(state, session, &cv, policy).await?;
    Ok(compose(&cv, &selection.set)?)
}

/// GET /api/v1/cvs/:id/document
pub async fn handle_get_document(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(id): Path<String>,
    Query(query): Query<SelectionQuery>,
) -> Result<Json<DocumentModel>, AppError> {
    Ok(Json(document_for(&state, &session, &id, query.policy).await?))
}

/// GET /api/v1/cvs/:id/preview
pub async fn handle_preview(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(id): Path<String>,
    Query(query): Query<SelectionQuery>,
) -> Result<Artifact, AppError> {
    let doc = document_for(&state, &session, &id, query.policy).await?;
    Ok(render(&doc, RenderTarget::Preview))
}

/// GET /api/v1/cvs/:id/export
pub async fn handle_export(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(id): Path<String>,
    Query(query): Query<SelectionQuery>,
) -> Result<Artifact, AppError> {
    let doc = document_for(&state, &session, &id, query.policy).await?;
    let artifact = render(&doc, RenderTarget::Download);
    tracing::info!("Exported {} ({} bytes)", artifact.file_name, artifact.bytes.len());
    Ok(artifact)
}
