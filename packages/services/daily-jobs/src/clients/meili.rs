use std::time::{Duration, Instant};

use reqwest::{Client, Method, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::clients::retry::{failure_summary, send_with_retry, RetryPolicy};
use crate::models::*;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnqueuedTask {
    pub task_uid: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Enqueued,
    Processing,
    Succeeded,
    Failed,
    Canceled,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MeiliTaskError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MeiliTask {
    pub uid: u64,
    pub status: TaskStatus,
    #[serde(default)]
    pub error: Option<MeiliTaskError>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexSettings {
    pub searchable_attributes: Vec<String>,
    pub filterable_attributes: Vec<String>,
    pub sortable_attributes: Vec<String>,
}

const INDEX_NOT_FOUND: &str = "index_not_found";
const INDEX_ALREADY_EXISTS: &str = "index_already_exists";

/// Meilisearch REST client covering index lifecycle, documents, settings
/// and task polling. Every write is asynchronous on the server side and
/// returns a task uid.
#[derive(Clone)]
pub struct MeiliClient {
    http: Client,
    host: String,
    api_key: String,
    retry: RetryPolicy,
    task_poll: Duration,
    task_timeout: Duration,
}

impl MeiliClient {
    pub fn new(
        http: Client,
        host: String,
        api_key: String,
        retry: RetryPolicy,
        task_poll: Duration,
        task_timeout: Duration,
    ) -> Self {
        Self {
            http,
            host: host.trim_end_matches('/').to_string(),
            api_key,
            retry,
            task_poll,
            task_timeout,
        }
    }

    async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Response> {
        let url = format!("{}{}", self.host, path);
        send_with_retry("meilisearch", self.retry, || {
            let req = self.http.request(method.clone(), &url).bearer_auth(&self.api_key);
            match body {
                Some(b) => req.json(b),
                None => req,
            }
        })
        .await
    }

    async fn enqueue(&self, op: &str, method: Method, path: &str, body: Option<&Value>) -> Result<EnqueuedTask> {
        let response = self.send(method, path, body).await?;
        if !response.status().is_success() {
            return Err(JobsError::SearchBackend(format!(
                "meilisearch {} failed: {}",
                op,
                failure_summary(response).await
            )));
        }
        let task: EnqueuedTask = response.json().await?;
        tracing::debug!(op = op, task_uid = task.task_uid, "meilisearch task enqueued");
        Ok(task)
    }

    fn index_path(uid: &str) -> String {
        format!("/indexes/{}", urlencoding::encode(uid))
    }

    pub async fn index_exists(&self, uid: &str) -> Result<bool> {
        let response = self.send(Method::GET, &Self::index_path(uid), None).await?;
        match response.status() {
            s if s.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(JobsError::SearchBackend(format!(
                "meilisearch get index failed: {}",
                failure_summary(response).await
            ))),
        }
    }

    /// Deletes `uid` and waits for completion; an index that does not exist is not an error.
    pub async fn delete_index_if_exists(&self, uid: &str) -> Result<()> {
        let response = self.send(Method::DELETE, &Self::index_path(uid), None).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        if !response.status().is_success() {
            return Err(JobsError::SearchBackend(format!(
                "meilisearch delete index failed: {}",
                failure_summary(response).await
            )));
        }
        let enqueued: EnqueuedTask = response.json().await?;
        let task = self.wait_for_task(enqueued.task_uid).await?;
        match task.status {
            TaskStatus::Succeeded => Ok(()),
            _ if task.error.as_ref().map(|e| e.code.as_str()) == Some(INDEX_NOT_FOUND) => Ok(()),
            _ => Err(Self::task_error("delete index", &task)),
        }
    }

    pub async fn create_index(&self, uid: &str, primary_key: &str) -> Result<EnqueuedTask> {
        let body = json!({ "uid": uid, "primaryKey": primary_key });
        self.enqueue("create index", Method::POST, "/indexes", Some(&body)).await
    }

    /// Creates `uid` and waits for the task. `POST /indexes` is retried on 5xx,
    /// so a duplicate create ending in `index_already_exists` counts as success.
    pub async fn create_index_and_wait(&self, uid: &str, primary_key: &str) -> Result<()> {
        let enqueued = self.create_index(uid, primary_key).await?;
        let task = self.wait_for_task(enqueued.task_uid).await?;
        match task.status {
            TaskStatus::Succeeded => Ok(()),
            _ if task.error.as_ref().map(|e| e.code.as_str()) == Some(INDEX_ALREADY_EXISTS) => {
                tracing::debug!(index = uid, task_uid = task.uid, "meilisearch index already created");
                Ok(())
            }
            _ => Err(Self::task_error("create index", &task)),
        }
    }

    pub async fn add_documents(&self, uid: &str, documents: &[Value]) -> Result<EnqueuedTask> {
        let body = Value::Array(documents.to_vec());
        let path = format!("{}/documents", Self::index_path(uid));
        self.enqueue("add documents", Method::POST, &path, Some(&body)).await
    }

    pub async fn update_settings(&self, uid: &str, settings: &IndexSettings) -> Result<EnqueuedTask> {
        let body = serde_json::to_value(settings)?;
        let path = format!("{}/settings", Self::index_path(uid));
        self.enqueue("update settings", Method::PATCH, &path, Some(&body)).await
    }

    /// Atomically exchanges the contents of two existing indexes.
    pub async fn swap_indexes(&self, a: &str, b: &str) -> Result<EnqueuedTask> {
        let body = json!([{ "indexes": [a, b] }]);
        self.enqueue("swap indexes", Method::POST, "/swap-indexes", Some(&body)).await
    }

    /// Polls until the task reaches a terminal state or the configured timeout elapses.
    pub async fn wait_for_task(&self, task_uid: u64) -> Result<MeiliTask> {
        let started = Instant::now();
        let path = format!("/tasks/{}", task_uid);
        loop {
            let response = self.send(Method::GET, &path, None).await?;
            if !response.status().is_success() {
                return Err(JobsError::SearchBackend(format!(
                    "meilisearch get task {} failed: {}",
                    task_uid,
                    failure_summary(response).await
                )));
            }
            let task: MeiliTask = response.json().await?;
            match task.status {
                TaskStatus::Succeeded | TaskStatus::Failed | TaskStatus::Canceled => return Ok(task),
                _ => {}
            }
            if started.elapsed() >= self.task_timeout {
                return Err(JobsError::Timeout(format!(
                    "meilisearch task {} still {:?} after {}ms",
                    task_uid,
                    task.status,
                    self.task_timeout.as_millis()
                )));
            }
            tokio::time::sleep(self.task_poll).await;
        }
    }

    /// Like `wait_for_task`, but any non-success terminal state is an error.
    pub async fn wait_for_success(&self, op: &str, enqueued: EnqueuedTask) -> Result<MeiliTask> {
        let task = self.wait_for_task(enqueued.task_uid).await?;
        if task.status != TaskStatus::Succeeded {
            return Err(Self::task_error(op, &task));
        }
        Ok(task)
    }

    fn task_error(op: &str, task: &MeiliTask) -> JobsError {
        let (code, message) = task
            .error
            .as_ref()
            .map(|e| (e.code.as_str(), e.message.as_str()))
            .unwrap_or(("unknown", ""));
        JobsError::SearchBackend(format!(
            "meilisearch {} task {} ended {:?}: {} {}",
            op, task.uid, task.status, code, message
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_deserialization() {
        let t: MeiliTask = serde_json::from_value(json!({
            "uid": 4, "status": "failed", "type": "indexDeletion",
            "error": { "code": "index_not_found", "message": "Index `x` not found.", "type": "invalid_request" }
        }))
        .unwrap();
        assert_eq!(t.status, TaskStatus::Failed);
        assert_eq!(t.error.unwrap().code, INDEX_NOT_FOUND);

        let t: MeiliTask = serde_json::from_value(json!({ "uid": 5, "status": "someNewState" })).unwrap();
        assert_eq!(t.status, TaskStatus::Unknown);
    }

    #[test]
    fn test_settings_serialize_camel_case() {
        let s = IndexSettings {
            searchable_attributes: vec!["title".into()],
            filterable_attributes: vec![],
            sortable_attributes: vec![],
        };
        let v = serde_json::to_value(&s).unwrap();
        assert_eq!(v["searchableAttributes"][0], "title");
        assert!(v.get("filterableAttributes").is_some());
    }
}
