use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::warn;

use crate::model::{LogEntry, SystemStatus, Task};
use crate::store::StoreUpdate;

const REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("malformed response body: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("task description is empty")]
    EmptyTask,
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: String,
}

impl ApiClient {
    pub fn new(base: &str) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self {
            http,
            base: base.trim_end_matches('/').to_string(),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String) -> Result<T, ApiError> {
        let body = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(serde_json::from_str(&body)?)
    }

    pub async fn fetch_status(&self) -> Result<SystemStatus, ApiError> {
        self.get_json(format!("{}/status", self.base)).await
    }

    pub async fn fetch_tasks(&self) -> Result<Vec<Task>, ApiError> {
        self.get_json(format!("{}/tasks", self.base)).await
    }

    // The server returns most-recent-first; the buffer wants chronological.
    pub async fn fetch_logs(&self, limit: usize) -> Result<Vec<LogEntry>, ApiError> {
        let mut entries: Vec<LogEntry> = self
            .get_json(format!("{}/logs?limit={limit}", self.base))
            .await?;
        entries.reverse();
        Ok(entries)
    }

    pub async fn start(&self) -> Result<(), ApiError> {
        self.http
            .post(format!("{}/start", self.base))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    pub async fn stop(&self) -> Result<(), ApiError> {
        self.http
            .post(format!("{}/stop", self.base))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    pub async fn submit_task(&self, description: &str, mode: &str) -> Result<(), ApiError> {
        let description = description.trim();
        if description.is_empty() {
            return Err(ApiError::EmptyTask);
        }
        self.http
            .post(format!("{}/tasks", self.base))
            .json(&json!({ "task": description, "mode": mode }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    // Refresh helpers run in spawned tasks; a fetch failure leaves the store
    // at its last-known-good value and only reaches the diagnostic sink. A
    // closed channel means the view has been torn down, so the response is
    // discarded.
    pub async fn refresh_status(&self, tx: &mpsc::Sender<StoreUpdate>) {
        match self.fetch_status().await {
            Ok(status) => {
                let _ = tx.send(StoreUpdate::Status(status)).await;
            }
            Err(err) => warn!(event = "status_fetch_error", error = %err),
        }
    }

    pub async fn refresh_tasks(&self, tx: &mpsc::Sender<StoreUpdate>) {
        match self.fetch_tasks().await {
            Ok(tasks) => {
                let _ = tx.send(StoreUpdate::Tasks(tasks)).await;
            }
            Err(err) => warn!(event = "tasks_fetch_error", error = %err),
        }
    }

    pub async fn seed_logs(&self, limit: usize, tx: &mpsc::Sender<StoreUpdate>) {
        match self.fetch_logs(limit).await {
            Ok(entries) => {
                let _ = tx.send(StoreUpdate::SeedLogs(entries)).await;
            }
            Err(err) => warn!(event = "logs_fetch_error", error = %err),
        }
    }

    // Commands are fire-and-forget: no retry, no success assumption, and the
    // displayed state reconverges via an unconditional snapshot refresh.
    pub async fn run_start(&self, tx: &mpsc::Sender<StoreUpdate>) {
        if let Err(err) = self.start().await {
            warn!(event = "start_command_error", error = %err);
        }
        self.refresh_status(tx).await;
        self.refresh_tasks(tx).await;
    }

    pub async fn run_stop(&self, tx: &mpsc::Sender<StoreUpdate>) {
        if let Err(err) = self.stop().await {
            warn!(event = "stop_command_error", error = %err);
        }
        self.refresh_status(tx).await;
        self.refresh_tasks(tx).await;
    }

    pub async fn run_submit(&self, description: String, mode: String, tx: &mpsc::Sender<StoreUpdate>) {
        match self.submit_task(&description, &mode).await {
            Ok(()) => {}
            // Rejected before any network I/O; nothing to reconverge with.
            Err(ApiError::EmptyTask) => {
                warn!(event = "submit_command_rejected", reason = "empty description");
                return;
            }
            Err(err) => warn!(event = "submit_command_error", error = %err),
        }
        self.refresh_status(tx).await;
        self.refresh_tasks(tx).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // The base points at a reserved port nothing listens on; a transport
    // error here would mean validation let the request out.
    fn client() -> ApiClient {
        ApiClient::new("http://127.0.0.1:9/")
    }

    #[test]
    fn base_url_is_normalized() {
        assert_eq!(client().base, "http://127.0.0.1:9");
    }

    #[tokio::test]
    async fn empty_submission_is_rejected_before_the_network() {
        let err = client().submit_task("", "auto").await.unwrap_err();
        assert!(matches!(err, ApiError::EmptyTask));
    }

    #[tokio::test]
    async fn whitespace_submission_is_rejected_before_the_network() {
        let err = client().submit_task("   \t\n", "auto").await.unwrap_err();
        assert!(matches!(err, ApiError::EmptyTask));
    }

    #[tokio::test]
    async fn empty_run_submit_skips_the_snapshot_refresh() {
        let (tx, mut rx) = mpsc::channel(4);
        client()
            .run_submit(String::new(), "auto".to_string(), &tx)
            .await;
        assert!(rx.try_recv().is_err());

        let (tx, mut rx) = mpsc::channel(4);
        client()
            .run_submit("   ".to_string(), "auto".to_string(), &tx)
            .await;
        assert!(rx.try_recv().is_err());
    }
}
