use std::sync::Arc;

use crate::analysis::normalize::FormatPolicy;
use crate::analysis::request::TweakNodes;
use crate::config::Config;
use crate::workflow_client::WorkflowRunner;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Pluggable workflow backend. Default: `WorkflowClient` over HTTP.
    pub workflow: Arc<dyn WorkflowRunner>,
    pub nodes: TweakNodes,
    pub format_policy: FormatPolicy,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(config: &Config, workflow: Arc<dyn WorkflowRunner>) -> Self {
        Self {
            workflow,
            nodes: TweakNodes {
                file_node_id: config.file_node_id.clone(),
                chat_node_id: config.chat_node_id.clone(),
            },
            format_policy: config.format_policy,
            max_upload_bytes: config.max_upload_bytes,
        }
    }
}
