//! Axum route handlers for the Analysis API.

use axum::{
    extract::{
        multipart::{Field, MultipartError},
        Multipart, State,
    },
    http::StatusCode,
    Json,
};
use tracing::debug;

use crate::analysis::analyzer::{analyze_resume, AnalysisResult};
use crate::analysis::request::{FilePayload, SearchQuery};
use crate::errors::AppError;
use crate::state::AppState;

const MISSING_FIELDS: &str = "Please fill in all fields and upload your resume.";

const PDF_MIME: &str = "application/pdf";
const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// POST /api/v1/analyze
///
/// Multipart form: `job_field` (required), `location` (optional), `resume`
/// (PDF or DOCX). Runs the hosted workflow once and returns the formatted
/// feedback.
pub async fn handle_analyze(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AnalysisResult>, AppError> {
    let mut job_field: Option<String> = None;
    let mut location = String::new();
    let mut resume: Option<FilePayload> = None;

    let max_bytes = state.max_upload_bytes;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| upload_error(e, max_bytes))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "job_field" => job_field = Some(read_text(field, max_bytes).await?),
            "location" => location = read_text(field, max_bytes).await?,
            "resume" => resume = Some(read_resume(field, max_bytes).await?),
            other => debug!("Ignoring unexpected form field '{other}'"),
        }
    }

    // Precondition for the request builder: job field and file both present.
    // Values are forwarded exactly as typed; trimming only decides blankness.
    let job_field = job_field
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| AppError::Validation(MISSING_FIELDS.to_string()))?;
    let resume = resume.ok_or_else(|| AppError::Validation(MISSING_FIELDS.to_string()))?;

    let query = SearchQuery { job_field, location };

    let result = analyze_resume(
        state.workflow.as_ref(),
        &state.nodes,
        state.format_policy,
        &query,
        &resume,
    )
    .await?;

    Ok(Json(result))
}

async fn read_text(field: Field<'_>, max_bytes: usize) -> Result<String, AppError> {
    field.text().await.map_err(|e| upload_error(e, max_bytes))
}

/// A body that blew through `DefaultBodyLimit` surfaces as a 413 multipart
/// error; report it like any other oversized résumé.
fn upload_error(err: MultipartError, max_bytes: usize) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::Validation(format!("Resume is too large (limit {max_bytes} bytes)"))
    } else {
        AppError::Validation(format!("Malformed upload: {}", err.body_text()))
    }
}

async fn read_resume(field: Field<'_>, max_bytes: usize) -> Result<FilePayload, AppError> {
    let file_name = field.file_name().unwrap_or_default().to_string();
    let content_type = field.content_type().unwrap_or_default().to_string();

    if !is_supported_document(&file_name, &content_type) {
        return Err(AppError::Validation(format!(
            "Unsupported file type for '{file_name}'. Upload a PDF or DOCX resume."
        )));
    }

    let bytes = field
        .bytes()
        .await
        .map_err(|e| upload_error(e, max_bytes))?;

    if bytes.is_empty() {
        return Err(AppError::Validation(MISSING_FIELDS.to_string()));
    }
    if bytes.len() > max_bytes {
        return Err(AppError::Validation(format!(
            "Resume is too large ({} bytes, limit {max_bytes} bytes)",
            bytes.len()
        )));
    }

    Ok(FilePayload { file_name, bytes })
}

fn is_supported_document(file_name: &str, content_type: &str) -> bool {
    let lower = file_name.to_ascii_lowercase();
    lower.ends_with(".pdf")
        || lower.ends_with(".docx")
        || content_type == PDF_MIME
        || content_type == DOCX_MIME
}
