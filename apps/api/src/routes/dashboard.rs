use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::auth::guard::CurrentSession;
use crate::models::cv::Cv;
use crate::models::user::PublicUser;
use crate::state::AppState;

const RECENT_LIMIT: usize = 5;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentCv {
    pub id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Cv> for RecentCv {
    fn from(cv: &Cv) -> Self {
        RecentCv {
            id: cv.id.clone(),
            name: cv.personal_info.as_ref().map(|p| p.name.clone()),
            email: cv.personal_info.as_ref().map(|p| p.email.clone()),
            updated_at: cv.updated_at,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub user: PublicUser,
    /// Only reported to admins.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_users: Option<usize>,
    pub total_cvs: usize,
    pub recent_cvs: Vec<RecentCv>,
}

fn most_recent(mut cvs: Vec<&Cv>, limit: usize) -> Vec<RecentCv> {
    cvs.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    cvs.into_iter().take(limit).map(RecentCv::from).collect()
}

/// GET /api/v1/dashboard
pub async fn handle_dashboard(
    State(state): State<AppState>,
    session: CurrentSession,
) -> Json<DashboardResponse> {
    let cvs = state.store.fetch_cvs().await;
    let visible: Vec<&Cv> = cvs
        .items
        .iter()
        .filter(|cv| cv.is_visible_to(&session.user))
        .collect();

    let total_users = if session.is_admin() {
        Some(state.store.fetch_users().await.items.len())
    } else {
        None
    };

    Json(DashboardResponse {
        total_users,
        total_cvs: visible.len(),
        recent_cvs: most_recent(visible, RECENT_LIMIT),
        user: session.user,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::cv::fixtures::sample_cv;
    use chrono::Duration;

    #[test]
    fn test_most_recent_orders_newest_first() {
        let mut cvs: Vec<Cv> = (0..7).map(|i| sample_cv(&format!("cv-{i}"), "u1")).collect();
        for (i, cv) in cvs.iter_mut().enumerate() {
            cv.updated_at = cv.updated_at + Duration::days(i as i64);
        }
        let recent = most_recent(cvs.iter().collect(), RECENT_LIMIT);
        let ids: Vec<_> = recent.iter().map(|r| r.id.clone().unwrap()).collect();
        assert_eq!(ids, vec!["cv-6", "cv-5", "cv-4", "cv-3", "cv-2"]);
    }
}
