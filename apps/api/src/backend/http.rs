use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::backend::{BackendError, CrudBackend, Resource};

/// List and create responses wrap rows in an `items` array.
#[derive(Debug, Deserialize)]
struct ItemsEnvelope {
    #[serde(default)]
    items: Vec<Value>,
}

/// reqwest client for the hosted CRUD API.
///
/// Every request carries `Authorization: Bearer <api key>`. Creates post a
/// single-element array; updates are `PUT` with the partial record.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpBackend {
    pub fn new(base_url: &str, api_key: String, timeout: Duration) -> Result<Self, BackendError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn collection_url(&self, resource: Resource) -> String {
        format!("{}/{}", self.base_url, resource.path())
    }

    fn record_url(&self, resource: Resource, id: &str) -> String {
        format!("{}/{}/{}", self.base_url, resource.path(), id)
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
    }
}

/// Maps non-success statuses onto `BackendError`, passing successes through.
async fn check_status(
    response: Response,
    resource: Resource,
    expected: StatusCode,
) -> Result<Response, BackendError> {
    let status = response.status();
    if status == expected {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    match status {
        StatusCode::FORBIDDEN => {
            warn!("403 Forbidden on /{resource}: insufficient permissions");
            Err(BackendError::Forbidden)
        }
        StatusCode::NOT_FOUND => {
            warn!("404 Not Found on /{resource}");
            Err(BackendError::NotFound)
        }
        StatusCode::BAD_REQUEST => {
            warn!("400 Bad Request on /{resource}: {body}");
            Err(BackendError::BadRequest(body))
        }
        _ => {
            warn!("Unexpected status {status} on /{resource}: {body}");
            Err(BackendError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[async_trait]
impl CrudBackend for HttpBackend {
    async fn list(&self, resource: Resource) -> Result<Vec<Value>, BackendError> {
        let response = self
            .authorized(self.client.get(self.collection_url(resource)))
            .send()
            .await?;
        let response = check_status(response, resource, StatusCode::OK).await?;
        let envelope: ItemsEnvelope = serde_json::from_slice(&response.bytes().await?)?;
        debug!("200 OK: {} rows from /{resource}", envelope.items.len());
        Ok(envelope.items)
    }

    async fn create(&self, resource: Resource, record: Value) -> Result<Value, BackendError> {
        let body = Value::Array(vec![record]);
        let response = self
            .authorized(self.client.post(self.collection_url(resource)))
            .json(&body)
            .send()
            .await?;
        let response = check_status(response, resource, StatusCode::CREATED).await?;
        let envelope: ItemsEnvelope = serde_json::from_slice(&response.bytes().await?)?;
        envelope
            .items
            .into_iter()
            .next()
            .ok_or(BackendError::EmptyCreate)
    }

    async fn update(
        &self,
        resource: Resource,
        id: &str,
        patch: Value,
    ) -> Result<Value, BackendError> {
        let response = self
            .authorized(self.client.put(self.record_url(resource, id)))
            .json(&patch)
            .send()
            .await?;
        let response = check_status(response, resource, StatusCode::OK).await?;
        Ok(serde_json::from_slice(&response.bytes().await?)?)
    }

    async fn delete(&self, resource: Resource, id: &str) -> Result<(), BackendError> {
        let response = self
            .authorized(self.client.delete(self.record_url(resource, id)))
            .send()
            .await?;
        check_status(response, resource, StatusCode::OK).await?;
        Ok(())
    }
}
