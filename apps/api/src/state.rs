use std::sync::Arc;

use crate::auth::session::SessionStore;
use crate::store::DomainStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<DomainStore>,
    pub sessions: Arc<SessionStore>,
}
