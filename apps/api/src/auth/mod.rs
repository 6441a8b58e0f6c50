//! Login against the user collection, and the per-session auth state.

pub mod guard;
pub mod session;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::models::user::PublicUser;
use crate::store::{require_loaded, DomainStore, StoreError};
use crate::validation::user_form::{validate_login_form, LoginForm, LoginFormErrors};
use crate::validation::FormValidation;

pub const INVALID_CREDENTIALS: &str = "Invalid username or password";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthState {
    pub user: Option<PublicUser>,
    pub is_authenticated: bool,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub enum AuthIntent {
    LoginStart,
    LoginSuccess(PublicUser),
    LoginFail(String),
    Logout,
    /// Restores a persisted state wholesale.
    Rehydrate(AuthState),
}

pub fn reduce(mut state: AuthState, intent: AuthIntent) -> AuthState {
    match intent {
        AuthIntent::LoginStart => {
            state.loading = true;
            state.error = None;
        }
        AuthIntent::LoginSuccess(user) => {
            state.loading = false;
            state.is_authenticated = true;
            state.user = Some(user);
            state.error = None;
        }
        AuthIntent::LoginFail(message) => {
            state.loading = false;
            state.error = Some(message);
        }
        AuthIntent::Logout => {
            state.user = None;
            state.is_authenticated = false;
            state.error = None;
        }
        AuthIntent::Rehydrate(persisted) => state = persisted,
    }
    state
}

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("Invalid login form")]
    InvalidForm(FormValidation<LoginFormErrors>),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Checks the credentials against a fresh user list. Passwords are compared
/// verbatim.
pub async fn login(store: &DomainStore, form: &LoginForm) -> Result<PublicUser, LoginError> {
    let validation = validate_login_form(form);
    if !validation.is_valid {
        return Err(LoginError::InvalidForm(validation));
    }

    let users = store.fetch_users().await;
    require_loaded(&users)?;

    match users
        .items
        .iter()
        .find(|u| u.username == form.username && u.password == form.password)
    {
        Some(user) => {
            let public = PublicUser::from(user);
            info!("User {} logged in", public.username);
            Ok(public)
        }
        None => {
            warn!("Failed login for username {}", form.username);
            Err(LoginError::InvalidCredentials)
        }
    }
}
