//! External CRUD backend: the hosted REST API that persists users and CVs.
//!
//! The store talks to it only through [`CrudBackend`], carried as
//! `Arc<dyn CrudBackend>`. Records cross this seam as raw JSON; typing happens
//! in the store.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub mod http;
#[cfg(test)]
pub mod memory;

pub use http::HttpBackend;

/// The resource collections exposed by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Users,
    Cvs,
}

impl Resource {
    pub fn path(&self) -> &'static str {
        match self {
            Resource::Users => "users",
            Resource::Cvs => "cvs",
        }
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Forbidden: insufficient permissions")]
    Forbidden,

    #[error("Not found")]
    NotFound,

    #[error("Unexpected status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("JSON decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Create succeeded but no record was returned")]
    EmptyCreate,
}

#[async_trait]
pub trait CrudBackend: Send + Sync {
    /// Returns every row of the collection.
    async fn list(&self, resource: Resource) -> Result<Vec<Value>, BackendError>;

    /// Creates one record and returns it as stored (with its `_uuid`).
    async fn create(&self, resource: Resource, record: Value) -> Result<Value, BackendError>;

    /// Sends a partial record and returns the updated row.
    async fn update(&self, resource: Resource, id: &str, patch: Value)
        -> Result<Value, BackendError>;

    async fn delete(&self, resource: Resource, id: &str) -> Result<(), BackendError>;
}
