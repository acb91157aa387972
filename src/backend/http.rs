//! HTTP implementation of [`TaskBackend`].
//!
//! Uses reqwest with optional Bearer auth. Paths are relative to the
//! configured base URL:
//!
//! ```text
//! GET    tasks                       global pool
//! GET    tasks/all                   every item regardless of linkage
//! GET    projects/{pid}/tasks        project subset (optional ?owner=)
//! POST   tasks                       create in the global pool
//! POST   projects/{pid}/tasks        create under a project
//! POST   meetings/{tid}/tasks        create under a meeting transcript
//! PATCH  tasks/{id}                  global update
//! PATCH  items/{id}                  shared update (project/meeting)
//! DELETE tasks/{id}                  hard delete
//! PUT    projects/{pid}/tasks/{id}   link
//! DELETE projects/{pid}/tasks/{id}   unlink
//! ```

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::backend::{BackendError, TaskBackend, WireDraft, WirePatch};
use crate::config::BackendConfig;
use crate::error::SyncError;
use crate::types::RawItem;

pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    api_token: Option<String>,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, SyncError> {
        Url::parse(&config.base_url)
            .map_err(|e| SyncError::Config(format!("invalid base URL '{}': {}", config.base_url, e)))?;

        Ok(Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path);
        let mut req = self.client.request(method, url);
        if let Some(ref token) = self.api_token {
            req = req.bearer_auth(token);
        }
        req
    }

    async fn send(&self, req: RequestBuilder) -> Result<reqwest::Response, BackendError> {
        let resp = req
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(BackendError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp)
    }

    async fn fetch_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
    ) -> Result<T, BackendError> {
        let resp = self.send(self.request(method, path)).await?;
        resp.json::<T>()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }

    async fn send_json<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, BackendError> {
        let resp = self.send(self.request(method, path).json(body)).await?;
        resp.json::<T>()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }

    /// Fire a call whose response body we don't care about. 204s and empty
    /// bodies are both fine.
    async fn send_no_body(&self, method: Method, path: &str) -> Result<(), BackendError> {
        let resp = self.send(self.request(method, path)).await?;
        if resp.status() == StatusCode::NO_CONTENT {
            return Ok(());
        }
        let _ = resp.bytes().await;
        Ok(())
    }
}

#[async_trait]
impl TaskBackend for HttpBackend {
    async fn list_global_items(&self) -> Result<Vec<RawItem>, BackendError> {
        self.fetch_json(Method::GET, "tasks").await
    }

    async fn list_project_items(
        &self,
        project_id: &str,
        owner: Option<&str>,
    ) -> Result<Vec<RawItem>, BackendError> {
        let path = match owner {
            Some(owner) => format!(
                "projects/{}/tasks?owner={}",
                project_id,
                urlencode(owner)
            ),
            None => format!("projects/{}/tasks", project_id),
        };
        self.fetch_json(Method::GET, &path).await
    }

    async fn list_all_items(&self) -> Result<Vec<RawItem>, BackendError> {
        self.fetch_json(Method::GET, "tasks/all").await
    }

    async fn create_global_item(&self, payload: &WireDraft) -> Result<RawItem, BackendError> {
        self.send_json(Method::POST, "tasks", payload).await
    }

    async fn create_project_item(
        &self,
        project_id: &str,
        payload: &WireDraft,
    ) -> Result<RawItem, BackendError> {
        self.send_json(Method::POST, &format!("projects/{}/tasks", project_id), payload)
            .await
    }

    async fn create_meeting_item(
        &self,
        transcription_id: &str,
        payload: &WireDraft,
    ) -> Result<RawItem, BackendError> {
        self.send_json(
            Method::POST,
            &format!("meetings/{}/tasks", transcription_id),
            payload,
        )
        .await
    }

    async fn update_item(&self, id: &str, payload: &WirePatch) -> Result<RawItem, BackendError> {
        self.send_json(Method::PATCH, &format!("items/{}", id), payload)
            .await
    }

    async fn update_global_item(
        &self,
        id: &str,
        payload: &WirePatch,
    ) -> Result<RawItem, BackendError> {
        self.send_json(Method::PATCH, &format!("tasks/{}", id), payload)
            .await
    }

    async fn delete_item(&self, id: &str) -> Result<(), BackendError> {
        self.send_no_body(Method::DELETE, &format!("tasks/{}", id)).await
    }

    async fn link_item_to_project(
        &self,
        project_id: &str,
        item_id: &str,
    ) -> Result<(), BackendError> {
        self.send_no_body(
            Method::PUT,
            &format!("projects/{}/tasks/{}", project_id, item_id),
        )
        .await
    }

    async fn unlink_item_from_project(
        &self,
        project_id: &str,
        item_id: &str,
    ) -> Result<(), BackendError> {
        self.send_no_body(
            Method::DELETE,
            &format!("projects/{}/tasks/{}", project_id, item_id),
        )
        .await
    }
}

/// Minimal query-component escaping for the owner filter.
fn urlencode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for b in value.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            b' ' => out.push_str("%20"),
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}
