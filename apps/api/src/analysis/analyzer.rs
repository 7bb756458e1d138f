//! One résumé analysis: build the run payload, execute the workflow once,
//! normalize the result.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::analysis::normalize::{normalize, FormatPolicy};
use crate::analysis::request::{build_request, FilePayload, SearchQuery, TweakNodes};
use crate::errors::AppError;
use crate::workflow_client::WorkflowRunner;

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub analysis_id: Uuid,
    pub input_value: String,
    pub policy: FormatPolicy,
    pub analysis: String,
    pub completed_at: DateTime<Utc>,
}

pub async fn analyze_resume(
    runner: &dyn WorkflowRunner,
    nodes: &TweakNodes,
    policy: FormatPolicy,
    query: &SearchQuery,
    file: &FilePayload,
) -> Result<AnalysisResult, AppError> {
    let analysis_id = Uuid::new_v4();
    let request = build_request(query, file, nodes);

    info!(
        %analysis_id,
        file = %file.file_name,
        file_bytes = file.bytes.len(),
        "Submitting resume to workflow"
    );

    let response = runner.run(&request).await?;
    let analysis = normalize(&response, policy)?;

    info!(%analysis_id, policy = %policy, chars = analysis.len(), "Analysis complete");

    Ok(AnalysisResult {
        analysis_id,
        input_value: request.input_value,
        policy,
        analysis,
        completed_at: Utc::now(),
    })
}
