//! Request Builder — turns a user's search query and uploaded résumé into the
//! workflow API's run payload. Pure and infallible: the caller enforces the
//! "job field present, file present" precondition before calling in.

use std::collections::BTreeMap;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use serde::Serialize;

const OUTPUT_TYPE: &str = "text";
const INPUT_TYPE: &str = "chat";

/// What the user is looking for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub job_field: String,
    /// May be empty.
    pub location: String,
}

impl SearchQuery {
    /// `Job Application for {job_field} roles in {location}`.
    /// An empty location still renders the trailing "in ".
    pub fn input_value(&self) -> String {
        format!(
            "Job Application for {} roles in {}",
            self.job_field, self.location
        )
    }
}

/// Raw bytes of an uploaded résumé (PDF or DOCX).
#[derive(Debug, Clone)]
pub struct FilePayload {
    pub file_name: String,
    pub bytes: Bytes,
}

impl FilePayload {
    /// Standard alphabet, padded, no line wrapping.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }
}

/// Workflow node identifiers the tweaks are keyed by. These are
/// deployment-specific and must match the remote flow exactly, otherwise the
/// service silently ignores the override.
#[derive(Debug, Clone)]
pub struct TweakNodes {
    pub file_node_id: String,
    pub chat_node_id: String,
}

/// A per-node parameter override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Tweak {
    File { file_content: String },
    Chat { value: String },
}

/// Body of `POST /lf/{workflow_id}/api/v1/run/{endpoint}`.
#[derive(Debug, Clone, Serialize)]
pub struct ApiRequest {
    pub input_value: String,
    pub output_type: &'static str,
    pub input_type: &'static str,
    pub tweaks: BTreeMap<String, Tweak>,
}

pub fn build_request(query: &SearchQuery, file: &FilePayload, nodes: &TweakNodes) -> ApiRequest {
    let input_value = query.input_value();

    let mut tweaks = BTreeMap::new();
    tweaks.insert(
        nodes.file_node_id.clone(),
        Tweak::File {
            file_content: file.to_base64(),
        },
    );
    tweaks.insert(
        nodes.chat_node_id.clone(),
        Tweak::Chat {
            value: input_value.clone(),
        },
    );

    ApiRequest {
        input_value,
        output_type: OUTPUT_TYPE,
        input_type: INPUT_TYPE,
        tweaks,
    }
}
