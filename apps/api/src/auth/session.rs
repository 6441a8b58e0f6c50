//! Bearer-token sessions.
//!
//! Each session holds an [`AuthState`] plus one [`SelectionState`] per CV the
//! user has opened. Only the auth part is written to the session file;
//! selections live as long as the process.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::{reduce, AuthIntent, AuthState};
use crate::models::cv::Cv;
use crate::models::user::PublicUser;
use crate::selection::{ReconcilePolicy, SelectionState};

#[derive(Debug, Clone, Default)]
pub struct Session {
    pub auth: AuthState,
    pub selections: HashMap<String, SelectionState>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedSession {
    token: Uuid,
    auth: AuthState,
}

pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Session>>,
    file: Option<PathBuf>,
    /// Serializes writers so an older snapshot never lands after a newer one.
    write_lock: Mutex<()>,
}

impl SessionStore {
    pub fn new(file: Option<PathBuf>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            file,
            write_lock: Mutex::new(()),
        }
    }

    /// Loads persisted sessions. A missing file is an empty store.
    pub async fn rehydrate(&self) -> Result<usize> {
        let Some(path) = &self.file else {
            return Ok(0);
        };
        let raw = match tokio::fs::read(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => {
                return Err(e).with_context(|| format!("reading session file {}", path.display()))
            }
        };
        let persisted: Vec<PersistedSession> = serde_json::from_slice(&raw)
            .with_context(|| format!("parsing session file {}", path.display()))?;

        let mut sessions = self.sessions.write().await;
        for entry in &persisted {
            let auth = reduce(AuthState::default(), AuthIntent::Rehydrate(entry.auth.clone()));
            sessions.insert(
                entry.token,
                Session {
                    auth,
                    selections: HashMap::new(),
                },
            );
        }
        info!("Rehydrated {} sessions from {}", persisted.len(), path.display());
        Ok(persisted.len())
    }

    /// Starts an authenticated session for `user` and returns its token.
    pub async fn open(&self, user: PublicUser) -> Uuid {
        let token = Uuid::new_v4();
        let auth = reduce(
            reduce(AuthState::default(), AuthIntent::LoginStart),
            AuthIntent::LoginSuccess(user),
        );
        self.sessions.write().await.insert(
            token,
            Session {
                auth,
                selections: HashMap::new(),
            },
        );
        self.persist_logged().await;
        token
    }

    pub async fn get(&self, token: Uuid) -> Option<Session> {
        self.sessions.read().await.get(&token).cloned()
    }

    /// Logs the session out and forgets it, returning the logged-out state.
    /// `None` for unknown tokens.
    pub async fn close(&self, token: Uuid) -> Option<AuthState> {
        let session = self.sessions.write().await.remove(&token)?;
        self.persist_logged().await;
        Some(reduce(session.auth, AuthIntent::Logout))
    }

    /// Replaces the identity held by every session of this user.
    pub async fn refresh_user(&self, user: &PublicUser) {
        let changed = {
            let mut sessions = self.sessions.write().await;
            let mut changed = false;
            for session in sessions.values_mut() {
                let same = session.auth.user.as_ref().is_some_and(|u| u.id == user.id);
                if same {
                    session.auth.user = Some(user.clone());
                    changed = true;
                }
            }
            changed
        };
        if changed {
            self.persist_logged().await;
        }
    }

    /// Ends every session belonging to the user with `user_id`.
    pub async fn close_user(&self, user_id: &str) -> usize {
        let removed = {
            let mut sessions = self.sessions.write().await;
            let before = sessions.len();
            sessions.retain(|_, session| {
                session.auth.user.as_ref().and_then(|u| u.id.as_deref()) != Some(user_id)
            });
            before - sessions.len()
        };
        if removed > 0 {
            self.persist_logged().await;
        }
        removed
    }

    /// Runs `f` on this session's selection for `cv`, seeding or reconciling
    /// it first. A given `policy` is remembered for later calls. `None` when
    /// the token is unknown.
    pub async fn with_selection<R>(
        &self,
        token: Uuid,
        cv: &Cv,
        policy: Option<ReconcilePolicy>,
        f: impl FnOnce(&mut SelectionState) -> R,
    ) -> Option<R> {
        let key = cv.id.clone().unwrap_or_default();
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&token)?;
        let selection = session
            .selections
            .entry(key)
            .or_insert_with(|| SelectionState::seeded(cv));
        selection.refresh(cv, policy);
        Some(f(selection))
    }

    async fn persist_logged(&self) {
        if let Err(e) = self.persist().await {
            warn!("Failed to persist sessions: {e:#}");
        }
    }

    /// Writes every authenticated session to the session file atomically.
    pub async fn persist(&self) -> Result<()> {
        let Some(path) = self.file.clone() else {
            return Ok(());
        };
        let _guard = self.write_lock.lock().await;
        let snapshot: Vec<PersistedSession> = {
            let sessions = self.sessions.read().await;
            let mut entries: Vec<PersistedSession> = sessions
                .iter()
                .filter(|(_, s)| s.auth.is_authenticated)
                .map(|(token, s)| PersistedSession {
                    token: *token,
                    auth: s.auth.clone(),
                })
                .collect();
            entries.sort_by_key(|e| e.token);
            entries
        };
        let body = serde_json::to_vec_pretty(&snapshot)?;

        tokio::task::spawn_blocking(move || write_atomically(&path, &body))
            .await
            .context("session writer task panicked")??;
        Ok(())
    }
}

fn write_atomically(path: &Path, body: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("creating temp file in {}", dir.display()))?;
    tmp.write_all(body)?;
    tmp.flush()?;
    tmp.persist(path)
        .with_context(|| format!("replacing {}", path.display()))?;
    Ok(())
}
