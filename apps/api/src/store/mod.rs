//! Domain Store: the in-process view of users and CVs held by the CRUD backend.
//!
//! Every operation is a backend call followed by one reducer step. The lock is
//! never held across an await, so concurrent operations resolve independently.

pub mod reducer;

use std::sync::Arc;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::backend::{BackendError, CrudBackend, Resource};
use crate::models::cv::{Cv, CvDraft, CvPatch};
use crate::models::user::{NewUser, PublicUser, Role, User, UserPatch, RESERVED_ADMIN_USERNAME};

pub use reducer::{reduce, Collection, CollectionIntent, FetchFailure, FetchStatus, FetchTicket};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Username already exists")]
    DuplicateUsername,

    #[error("Record not found")]
    NotFound,

    #[error("Forbidden: insufficient permissions")]
    Forbidden,

    #[error("Rejected by backend: {0}")]
    Rejected(String),

    #[error("Collection unavailable: {0}")]
    Unavailable(String),

    #[error("Backend error: {0}")]
    Backend(BackendError),

    #[error("Record decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<BackendError> for StoreError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Forbidden => StoreError::Forbidden,
            BackendError::NotFound => StoreError::NotFound,
            BackendError::BadRequest(body) => StoreError::Rejected(body),
            BackendError::Decode(e) => StoreError::Decode(e),
            other => StoreError::Backend(other),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StoreState {
    pub cvs: Collection<Cv>,
    pub users: Collection<User>,
}

pub struct DomainStore {
    backend: Arc<dyn CrudBackend>,
    state: RwLock<StoreState>,
}

fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>, BackendError> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(BackendError::from))
        .collect()
}

fn fetch_failure(resource: Resource, err: &BackendError) -> FetchFailure {
    match err {
        BackendError::Forbidden => {
            warn!("Fetching {resource} denied; storing an empty list");
            FetchFailure::Denied
        }
        other => {
            error!("Fetching {resource} failed: {other}");
            FetchFailure::Failed
        }
    }
}

impl DomainStore {
    pub fn new(backend: Arc<dyn CrudBackend>) -> Self {
        Self {
            backend,
            state: RwLock::new(StoreState::default()),
        }
    }

    pub async fn cvs(&self) -> Collection<Cv> {
        self.state.read().await.cvs.clone()
    }

    pub async fn users(&self) -> Collection<User> {
        self.state.read().await.users.clone()
    }

    async fn apply_cvs(&self, intent: CollectionIntent<Cv>) {
        let mut state = self.state.write().await;
        let current = std::mem::take(&mut state.cvs);
        state.cvs = reduce(current, intent);
    }

    async fn apply_users(&self, intent: CollectionIntent<User>) {
        let mut state = self.state.write().await;
        let current = std::mem::take(&mut state.users);
        state.users = reduce(current, intent);
    }

    async fn begin_cvs_fetch(&self) -> FetchTicket {
        let mut state = self.state.write().await;
        let current = std::mem::take(&mut state.cvs);
        state.cvs = reduce(current, CollectionIntent::FetchStarted);
        state.cvs.ticket()
    }

    async fn begin_users_fetch(&self) -> FetchTicket {
        let mut state = self.state.write().await;
        let current = std::mem::take(&mut state.users);
        state.users = reduce(current, CollectionIntent::FetchStarted);
        state.users.ticket()
    }

    /// Replaces the CV collection with the backend's rows. A denied or failed
    /// fetch leaves an empty list; check `status` to tell it apart from "no CVs".
    pub async fn fetch_cvs(&self) -> Collection<Cv> {
        let ticket = self.begin_cvs_fetch().await;
        let fetched = self
            .backend
            .list(Resource::Cvs)
            .await
            .and_then(decode_rows::<Cv>);
        let intent = match fetched {
            Ok(items) => {
                debug!("Fetched {} CVs", items.len());
                CollectionIntent::FetchSucceeded { ticket, items }
            }
            Err(err) => CollectionIntent::FetchFailed {
                ticket,
                failure: fetch_failure(Resource::Cvs, &err),
                message: err.to_string(),
            },
        };
        self.apply_cvs(intent).await;

        let cvs = self.cvs().await;
        if cvs.revision != ticket.revision {
            warn!("Discarded a stale CV fetch after a concurrent mutation");
        }
        cvs
    }

    pub async fn fetch_users(&self) -> Collection<User> {
        let ticket = self.begin_users_fetch().await;
        let fetched = self
            .backend
            .list(Resource::Users)
            .await
            .and_then(decode_rows::<User>);
        let intent = match fetched {
            Ok(items) => {
                debug!("Fetched {} users", items.len());
                CollectionIntent::FetchSucceeded { ticket, items }
            }
            Err(err) => CollectionIntent::FetchFailed {
                ticket,
                failure: fetch_failure(Resource::Users, &err),
                message: err.to_string(),
            },
        };
        self.apply_users(intent).await;

        let users = self.users().await;
        if users.revision != ticket.revision {
            warn!("Discarded a stale user fetch after a concurrent mutation");
        }
        users
    }

    /// Creates a user after checking a fresh user list for the same username.
    /// A duplicate is rejected locally; nothing is sent.
    pub async fn create_user(&self, new_user: NewUser) -> Result<User, StoreError> {
        let users = self.fetch_users().await;
        if users.items.iter().any(|u| u.username == new_user.username) {
            warn!("Username {} already exists", new_user.username);
            self.apply_users(CollectionIntent::MutationFailed(
                StoreError::DuplicateUsername.to_string(),
            ))
            .await;
            return Err(StoreError::DuplicateUsername);
        }

        let result = async {
            let record = serde_json::to_value(&new_user)?;
            let row = self.backend.create(Resource::Users, record).await?;
            Ok::<User, StoreError>(serde_json::from_value(row)?)
        }
        .await;

        match result {
            Ok(user) => {
                info!("User created: {:?}", PublicUser::from(&user));
                self.apply_users(CollectionIntent::Created(user.clone())).await;
                Ok(user)
            }
            Err(err) => Err(self.user_mutation_failed("create", err).await),
        }
    }

    pub async fn update_user(&self, id: &str, patch: UserPatch) -> Result<User, StoreError> {
        let result = async {
            let record = serde_json::to_value(&patch)?;
            let row = self.backend.update(Resource::Users, id, record).await?;
            Ok::<User, StoreError>(serde_json::from_value(row)?)
        }
        .await;

        match result {
            Ok(user) => {
                info!("User updated: {:?}", PublicUser::from(&user));
                self.apply_users(CollectionIntent::Updated(user.clone())).await;
                Ok(user)
            }
            Err(err) => Err(self.user_mutation_failed("update", err).await),
        }
    }

    /// Deletes one user record. CVs owned by the user are left to
    /// [`DomainStore::delete_cvs_owned_by`].
    pub async fn delete_user(&self, id: &str) -> Result<(), StoreError> {
        match self.backend.delete(Resource::Users, id).await {
            Ok(()) => {
                info!("User {id} deleted");
                self.apply_users(CollectionIntent::Deleted(id.to_string())).await;
                Ok(())
            }
            Err(err) => Err(self.user_mutation_failed("delete", err.into()).await),
        }
    }

    /// Creates a CV owned by `user_id`, stamped with the submission time.
    pub async fn create_cv(&self, user_id: &str, draft: CvDraft) -> Result<Cv, StoreError> {
        let cv = Cv::from_draft(draft, user_id, Utc::now());
        let result = async {
            let mut record = serde_json::to_value(&cv)?;
            record["_user"] = Value::String(user_id.to_string());
            record["_owner"] = Value::String(user_id.to_string());
            let row = self.backend.create(Resource::Cvs, record).await?;
            Ok::<Cv, StoreError>(serde_json::from_value(row)?)
        }
        .await;

        match result {
            Ok(cv) => {
                info!("CV {:?} created for user {user_id}", cv.id);
                self.apply_cvs(CollectionIntent::Created(cv.clone())).await;
                Ok(cv)
            }
            Err(err) => Err(self.cv_mutation_failed("create", err).await),
        }
    }

    /// Sends a partial update. `updated_at` is always refreshed.
    pub async fn update_cv(&self, id: &str, mut patch: CvPatch) -> Result<Cv, StoreError> {
        patch.updated_at = Some(Utc::now());
        let result = async {
            let record = serde_json::to_value(&patch)?;
            let row = self.backend.update(Resource::Cvs, id, record).await?;
            Ok::<Cv, StoreError>(serde_json::from_value(row)?)
        }
        .await;

        match result {
            Ok(cv) => {
                info!("CV {id} updated");
                self.apply_cvs(CollectionIntent::Updated(cv.clone())).await;
                Ok(cv)
            }
            Err(err) => Err(self.cv_mutation_failed("update", err).await),
        }
    }

    pub async fn delete_cv(&self, id: &str) -> Result<(), StoreError> {
        match self.backend.delete(Resource::Cvs, id).await {
            Ok(()) => {
                info!("CV {id} deleted");
                self.apply_cvs(CollectionIntent::Deleted(id.to_string())).await;
                Ok(())
            }
            Err(err) => Err(self.cv_mutation_failed("delete", err.into()).await),
        }
    }

    /// Deletes every CV whose `userId` is `user_id`, returning how many went.
    /// Stops at the first failed delete.
    pub async fn delete_cvs_owned_by(&self, user_id: &str) -> Result<usize, StoreError> {
        let cvs = self.fetch_cvs().await;
        require_loaded(&cvs)?;

        let owned: Vec<String> = cvs
            .items
            .iter()
            .filter(|cv| cv.user_id == user_id)
            .filter_map(|cv| cv.id.clone())
            .collect();
        for id in &owned {
            self.delete_cv(id).await?;
        }
        info!("Deleted {} CVs owned by user {user_id}", owned.len());
        Ok(owned.len())
    }

    /// Looks the CV up in the current snapshot, fetching once when it is absent.
    pub async fn find_cv(&self, id: &str) -> Result<Cv, StoreError> {
        if let Some(cv) = self.state.read().await.cvs.find(id) {
            return Ok(cv.clone());
        }
        let cvs = self.fetch_cvs().await;
        if let Some(cv) = cvs.find(id) {
            return Ok(cv.clone());
        }
        require_loaded(&cvs)?;
        Err(StoreError::NotFound)
    }

    pub async fn find_user(&self, id: &str) -> Result<User, StoreError> {
        if let Some(user) = self.state.read().await.users.find(id) {
            return Ok(user.clone());
        }
        let users = self.fetch_users().await;
        if let Some(user) = users.find(id) {
            return Ok(user.clone());
        }
        require_loaded(&users)?;
        Err(StoreError::NotFound)
    }

    /// Creates the reserved admin account unless a user with that username
    /// exists. Returns whether an account was created.
    pub async fn initialize_admin_user(&self, password: &str) -> Result<bool, StoreError> {
        let users = self.fetch_users().await;
        require_loaded(&users)?;
        if users
            .items
            .iter()
            .any(|u| u.username == RESERVED_ADMIN_USERNAME)
        {
            info!("Admin user already exists");
            return Ok(false);
        }

        self.create_user(NewUser {
            name: "Administrator".to_string(),
            email: "admin@example.com".to_string(),
            username: RESERVED_ADMIN_USERNAME.to_string(),
            password: password.to_string(),
            role: Role::Admin,
        })
        .await?;
        info!("Admin user initialized");
        Ok(true)
    }

    async fn cv_mutation_failed(&self, action: &str, err: StoreError) -> StoreError {
        log_mutation_failure("CV", action, &err);
        self.apply_cvs(CollectionIntent::MutationFailed(err.to_string()))
            .await;
        err
    }

    async fn user_mutation_failed(&self, action: &str, err: StoreError) -> StoreError {
        log_mutation_failure("user", action, &err);
        self.apply_users(CollectionIntent::MutationFailed(err.to_string()))
            .await;
        err
    }
}

fn log_mutation_failure(kind: &str, action: &str, err: &StoreError) {
    match err {
        StoreError::NotFound | StoreError::Forbidden | StoreError::Rejected(_) => {
            warn!("Failed to {action} {kind}: {err}")
        }
        _ => error!("Failed to {action} {kind}: {err}"),
    }
}

pub(crate) fn require_loaded<T>(collection: &Collection<T>) -> Result<(), StoreError> {
    match collection.status {
        FetchStatus::Loaded => Ok(()),
        FetchStatus::Denied => Err(StoreError::Forbidden),
        FetchStatus::Failed | FetchStatus::NotLoaded => Err(StoreError::Unavailable(
            collection
                .error
                .clone()
                .unwrap_or_else(|| "not loaded".to_string()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::MemoryBackend;
    use crate::models::cv::fixtures::sample_draft;

    fn setup() -> (Arc<MemoryBackend>, DomainStore) {
        let backend = Arc::new(MemoryBackend::new());
        let store = DomainStore::new(backend.clone());
        (backend, store)
    }

    fn new_user(username: &str, name: &str) -> NewUser {
        NewUser {
            name: name.to_string(),
            email: format!("{username}@example.com"),
            username: username.to_string(),
            password: "Secret123!".to_string(),
            role: Role::User,
        }
    }

    #[tokio::test]
    async fn test_duplicate_username_is_rejected_without_post() {
        let (backend, store) = setup();
        store.create_user(new_user("alice1", "Alice")).await.unwrap();

        let err = store
            .create_user(new_user("alice1", "Alice Again"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateUsername));

        let users = store.users().await;
        assert_eq!(users.items.len(), 1);
        assert_eq!(users.error.as_deref(), Some("Username already exists"));
        assert_eq!(backend.rows(Resource::Users).len(), 1);
        let creates = backend
            .calls()
            .iter()
            .filter(|c| c.as_str() == "create users")
            .count();
        assert_eq!(creates, 1);
    }

    #[tokio::test]
    async fn test_cascade_deletes_only_owned_cvs() {
        let (backend, store) = setup();
        let alice = store.create_user(new_user("alice1", "Sam Lee")).await.unwrap();
        // Same display name, different account.
        let other = store.create_user(new_user("samlee", "Sam Lee")).await.unwrap();
        let alice_id = alice.id.clone().unwrap();
        let other_id = other.id.clone().unwrap();

        store.create_cv(&alice_id, sample_draft()).await.unwrap();
        store.create_cv(&alice_id, sample_draft()).await.unwrap();
        let kept = store.create_cv(&other_id, sample_draft()).await.unwrap();

        store.delete_user(&alice_id).await.unwrap();
        let removed = store.delete_cvs_owned_by(&alice_id).await.unwrap();
        assert_eq!(removed, 2);

        let cvs = store.cvs().await;
        assert_eq!(cvs.items.len(), 1);
        assert_eq!(cvs.items[0].id, kept.id);
        assert_eq!(backend.rows(Resource::Cvs).len(), 1);
        assert_eq!(store.users().await.items.len(), 1);
    }

    #[tokio::test]
    async fn test_denied_fetch_stores_empty_list_with_status() {
        let (backend, store) = setup();
        backend.deny(Resource::Users);

        let users = store.fetch_users().await;
        assert!(users.items.is_empty());
        assert_eq!(users.status, FetchStatus::Denied);
        assert!(users.error.is_some());
        assert!(matches!(
            store.find_user("anything").await.unwrap_err(),
            StoreError::Forbidden
        ));
    }

    #[tokio::test]
    async fn test_create_cv_stamps_timestamps_and_owner_fields() {
        let (backend, store) = setup();
        let cv = store.create_cv("user-1", sample_draft()).await.unwrap();
        assert_eq!(cv.created_at, cv.updated_at);
        assert_eq!(cv.user_id, "user-1");

        let row = &backend.rows(Resource::Cvs)[0];
        assert_eq!(row["_user"], "user-1");
        assert_eq!(row["_owner"], "user-1");
        assert_eq!(row["personalInfo"]["name"], "Kari Nordmann");
    }

    #[tokio::test]
    async fn test_update_cv_refreshes_updated_at() {
        let (_, store) = setup();
        let cv = store.create_cv("user-1", sample_draft()).await.unwrap();
        let id = cv.id.clone().unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        let updated = store
            .update_cv(
                &id,
                CvPatch {
                    skills: Some(vec!["Zig".to_string()]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.skills, vec!["Zig".to_string()]);
        assert!(updated.updated_at > cv.updated_at);
        assert_eq!(updated.created_at, cv.created_at);
        assert_eq!(store.find_cv(&id).await.unwrap().skills, updated.skills);
    }

    #[tokio::test]
    async fn test_missing_records_surface_not_found() {
        let (_, store) = setup();
        assert!(matches!(
            store.update_cv("nope", CvPatch::default()).await.unwrap_err(),
            StoreError::NotFound
        ));
        assert!(matches!(
            store.delete_user("nope").await.unwrap_err(),
            StoreError::NotFound
        ));
        assert!(matches!(
            store.find_cv("nope").await.unwrap_err(),
            StoreError::NotFound
        ));
    }

    #[tokio::test]
    async fn test_find_cv_fetches_when_absent_from_snapshot() {
        let backend = Arc::new(MemoryBackend::new());
        let writer = DomainStore::new(backend.clone());
        let cv = writer.create_cv("user-1", sample_draft()).await.unwrap();

        let reader = DomainStore::new(backend.clone());
        let found = reader.find_cv(cv.id.as_deref().unwrap()).await.unwrap();
        assert_eq!(found.id, cv.id);
        assert_eq!(backend.calls().last().map(String::as_str), Some("list cvs"));
    }

    #[tokio::test]
    async fn test_initialize_admin_user_once() {
        let (backend, store) = setup();
        assert!(store.initialize_admin_user("changeme").await.unwrap());
        assert!(!store.initialize_admin_user("changeme").await.unwrap());

        let rows = backend.rows(Resource::Users);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["username"], "admin");
        assert_eq!(rows[0]["role"], "admin");
    }
}
