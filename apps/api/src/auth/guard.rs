use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user::{PublicUser, Role};
use crate::state::AppState;

fn bearer_token(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .and_then(|t| Uuid::parse_str(t.trim()).ok())
}

/// An authenticated session. Rejects with 401 when the bearer token is
/// missing, unknown or logged out.
#[derive(Debug, Clone)]
pub struct CurrentSession {
    pub token: Uuid,
    pub user: PublicUser,
}

impl CurrentSession {
    pub fn is_admin(&self) -> bool {
        self.user.role == Role::Admin
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let token = bearer_token(&parts.headers).ok_or(AppError::Unauthorized)?;
        let session = state
            .sessions
            .get(token)
            .await
            .ok_or(AppError::Unauthorized)?;
        match session.auth.user {
            Some(user) if session.auth.is_authenticated => Ok(CurrentSession { token, user }),
            _ => Err(AppError::Unauthorized),
        }
    }
}

/// A session whose user has the admin role. 403 for everybody else.
#[derive(Debug, Clone)]
pub struct AdminSession(pub CurrentSession);

#[axum::async_trait]
impl FromRequestParts<AppState> for AdminSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let session = CurrentSession::from_request_parts(parts, state).await?;
        if !session.is_admin() {
            return Err(AppError::Forbidden);
        }
        Ok(AdminSession(session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_parsing() {
        let token = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_none());

        headers.insert(
            "authorization",
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        assert_eq!(bearer_token(&headers), Some(token));

        headers.insert("authorization", HeaderValue::from_static("Bearer nope"));
        assert!(bearer_token(&headers).is_none());

        headers.insert(
            "authorization",
            HeaderValue::from_str(&format!("Basic {token}")).unwrap(),
        );
        assert!(bearer_token(&headers).is_none());
    }
}
