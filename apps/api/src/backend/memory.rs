//! In-memory `CrudBackend` used by store and route tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::backend::{BackendError, CrudBackend, Resource};

#[derive(Default)]
pub struct MemoryBackend {
    rows: Mutex<HashMap<Resource, Vec<Value>>>,
    next_id: AtomicU64,
    denied: Mutex<Vec<Resource>>,
    calls: Mutex<Vec<String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every call against `resource` answer 403.
    pub fn deny(&self, resource: Resource) {
        self.denied.lock().unwrap().push(resource);
    }

    pub fn allow(&self, resource: Resource) {
        self.denied.lock().unwrap().retain(|r| *r != resource);
    }

    pub fn rows(&self, resource: Resource) -> Vec<Value> {
        self.rows
            .lock()
            .unwrap()
            .get(&resource)
            .cloned()
            .unwrap_or_default()
    }

    /// Calls seen so far, as `"<verb> <resource>"`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn enter(&self, verb: &str, resource: Resource) -> Result<(), BackendError> {
        self.calls.lock().unwrap().push(format!("{verb} {resource}"));
        if self.denied.lock().unwrap().contains(&resource) {
            return Err(BackendError::Forbidden);
        }
        Ok(())
    }
}

fn id_of(row: &Value) -> Option<&str> {
    row.get("_uuid").and_then(Value::as_str)
}

#[async_trait]
impl CrudBackend for MemoryBackend {
    async fn list(&self, resource: Resource) -> Result<Vec<Value>, BackendError> {
        self.enter("list", resource)?;
        Ok(self.rows(resource))
    }

    async fn create(&self, resource: Resource, mut record: Value) -> Result<Value, BackendError> {
        self.enter("create", resource)?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        record["_uuid"] = Value::String(format!("{}-{id}", resource.path()));
        self.rows
            .lock()
            .unwrap()
            .entry(resource)
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        resource: Resource,
        id: &str,
        patch: Value,
    ) -> Result<Value, BackendError> {
        self.enter("update", resource)?;
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .entry(resource)
            .or_default()
            .iter_mut()
            .find(|row| id_of(row) == Some(id))
            .ok_or(BackendError::NotFound)?;
        if let (Some(target), Value::Object(fields)) = (row.as_object_mut(), patch) {
            for (key, value) in fields {
                target.insert(key, value);
            }
        }
        Ok(row.clone())
    }

    async fn delete(&self, resource: Resource, id: &str) -> Result<(), BackendError> {
        self.enter("delete", resource)?;
        let mut rows = self.rows.lock().unwrap();
        let collection = rows.entry(resource).or_default();
        let before = collection.len();
        collection.retain(|row| id_of(row) != Some(id));
        if collection.len() == before {
            return Err(BackendError::NotFound);
        }
        Ok(())
    }
}
