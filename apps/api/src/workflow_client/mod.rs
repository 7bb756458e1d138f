/// Workflow Client — the single point of entry for calls to the hosted
/// workflow-execution API.
///
/// One attempt per call. A failed run is surfaced to the caller as-is; the
/// user resubmits if they want another go.
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::analysis::request::ApiRequest;
use crate::config::Config;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("The analysis timed out after {}s. The workflow may be busy; please try again in a few minutes.", .0.as_secs())]
    Timeout(Duration),

    #[error("Failed to connect to API: {0}")]
    ConnectionFailure(#[source] reqwest::Error),

    #[error("API request failed with status code: {status}")]
    RequestFailed { status: u16 },

    #[error("Invalid JSON response from API: {0}")]
    MalformedResponse(String),
}

/// Anything that can execute a workflow run. `AppState` carries an
/// `Arc<dyn WorkflowRunner>`.
#[async_trait]
pub trait WorkflowRunner: Send + Sync {
    async fn run(&self, request: &ApiRequest) -> Result<Value, WorkflowError>;
}

/// HTTP client for `POST {base}/lf/{workflow_id}/api/v1/run/{endpoint}`.
#[derive(Clone)]
pub struct WorkflowClient {
    client: Client,
    run_url: String,
    token: String,
    timeout: Option<Duration>,
}

impl WorkflowClient {
    pub fn new(run_url: String, token: String, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            run_url,
            token,
            timeout,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.run_url(),
            config.langflow_token.clone(),
            config.request_timeout,
        )
    }

    pub fn run_url(&self) -> &str {
        &self.run_url
    }

    fn classify(&self, err: reqwest::Error) -> WorkflowError {
        match self.timeout {
            Some(timeout) if err.is_timeout() => WorkflowError::Timeout(timeout),
            _ => WorkflowError::ConnectionFailure(err),
        }
    }
}

#[async_trait]
impl WorkflowRunner for WorkflowClient {
    async fn run(&self, request: &ApiRequest) -> Result<Value, WorkflowError> {
        let started = Instant::now();

        let response = self
            .client
            .post(&self.run_url)
            .bearer_auth(&self.token)
            .header(header::CONTENT_TYPE, "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!("Workflow API returned {status}");
            return Err(WorkflowError::RequestFailed {
                status: status.as_u16(),
            });
        }

        // Read the body separately so a stalled body still counts as a timeout
        // and a garbled one as malformed.
        let body = response.bytes().await.map_err(|e| self.classify(e))?;
        let value: Value = serde_json::from_slice(&body)
            .map_err(|e| WorkflowError::MalformedResponse(e.to_string()))?;

        debug!(
            "Workflow run succeeded: {} bytes in {}ms",
            body.len(),
            started.elapsed().as_millis()
        );

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::{extract::State, http::HeaderMap, routing::post, Json, Router};
    use bytes::Bytes;
    use serde_json::json;

    use super::*;
    use crate::analysis::request::{build_request, FilePayload, SearchQuery, TweakNodes};

    const RUN_PATH: &str = "/lf/flow-123/api/v1/run/candidate";

    #[derive(Clone, Default)]
    struct Upstream {
        hits: Arc<AtomicUsize>,
        seen: Arc<std::sync::Mutex<Option<(HeaderMap, Value)>>>,
    }

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}{RUN_PATH}")
    }

    fn sample_request() -> ApiRequest {
        build_request(
            &SearchQuery {
                job_field: "Data Science".to_string(),
                location: "New York".to_string(),
            },
            &FilePayload {
                file_name: "cv.pdf".to_string(),
                bytes: Bytes::from_static(b"%PDF"),
            },
            &TweakNodes {
                file_node_id: "File-abc12".to_string(),
                chat_node_id: "ChatInput-xyz34".to_string(),
            },
        )
    }

    fn client(url: String, timeout: Option<Duration>) -> WorkflowClient {
        WorkflowClient::new(url, "secret-token".to_string(), timeout).unwrap()
    }

    #[tokio::test]
    async fn test_run_sends_bearer_and_payload() {
        let upstream = Upstream::default();
        let router = Router::new()
            .route(
                RUN_PATH,
                post(
                    |State(up): State<Upstream>, headers: HeaderMap, Json(body): Json<Value>| async move {
                        up.hits.fetch_add(1, Ordering::SeqCst);
                        *up.seen.lock().unwrap() = Some((headers, body));
                        Json(json!({ "outputs": [] }))
                    },
                ),
            )
            .with_state(upstream.clone());
        let url = serve(router).await;

        let value = client(url, Some(Duration::from_secs(5)))
            .run(&sample_request())
            .await
            .unwrap();
        assert_eq!(value, json!({ "outputs": [] }));

        let (headers, body) = upstream.seen.lock().unwrap().take().unwrap();
        assert_eq!(headers["authorization"], "Bearer secret-token");
        assert_eq!(headers["content-type"], "application/json");
        assert_eq!(body["input_type"], "chat");
        assert_eq!(body["output_type"], "text");
        assert_eq!(body["tweaks"]["File-abc12"]["file_content"], "JVBERg==");
        assert_eq!(
            body["tweaks"]["ChatInput-xyz34"]["value"],
            "Job Application for Data Science roles in New York"
        );
    }

    #[tokio::test]
    async fn test_timeout_surfaces_once_without_retry() {
        let upstream = Upstream::default();
        let router = Router::new()
            .route(
                RUN_PATH,
                post(|State(up): State<Upstream>| async move {
                    up.hits.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Json(json!({}))
                }),
            )
            .with_state(upstream.clone());
        let url = serve(router).await;

        let err = client(url, Some(Duration::from_millis(200)))
            .run(&sample_request())
            .await
            .unwrap_err();

        assert!(matches!(err, WorkflowError::Timeout(_)), "got {err:?}");
        assert!(err.to_string().contains("try again"));
        assert_eq!(upstream.hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_non_200_is_request_failed() {
        let upstream = Upstream::default();
        let router = Router::new()
            .route(
                RUN_PATH,
                post(|State(up): State<Upstream>| async move {
                    up.hits.fetch_add(1, Ordering::SeqCst);
                    (axum::http::StatusCode::SERVICE_UNAVAILABLE, "busy")
                }),
            )
            .with_state(upstream.clone());
        let url = serve(router).await;

        let err = client(url, None).run(&sample_request()).await.unwrap_err();
        assert!(matches!(err, WorkflowError::RequestFailed { status: 503 }));
        assert_eq!(upstream.hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_other_2xx_is_request_failed() {
        let router = Router::new().route(
            RUN_PATH,
            post(|| async { (axum::http::StatusCode::ACCEPTED, Json(json!({}))) }),
        );
        let url = serve(router).await;

        let err = client(url, None).run(&sample_request()).await.unwrap_err();
        assert!(matches!(err, WorkflowError::RequestFailed { status: 202 }));
    }

    #[tokio::test]
    async fn test_unparsable_body_is_malformed() {
        let router = Router::new().route(RUN_PATH, post(|| async { "<html>oops</html>" }));
        let url = serve(router).await;

        let err = client(url, None).run(&sample_request()).await.unwrap_err();
        assert!(matches!(err, WorkflowError::MalformedResponse(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_refused_connection_is_connection_failure() {
        // Bind then drop to get a port nothing listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(format!("http://{addr}{RUN_PATH}"), Some(Duration::from_secs(5)))
            .run(&sample_request())
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::ConnectionFailure(_)), "got {err:?}");
        assert!(err.to_string().starts_with("Failed to connect to API"));
    }
}
