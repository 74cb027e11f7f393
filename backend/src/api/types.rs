//! REST API payloads.
//!
//! Field names are snake_case on the wire (`task_id`, `status`, `error`).

use serde::{Deserialize, Serialize};

use crate::jobs::{JobRecord, JobState};

/// Returned by `POST /upload`, whether or not processing succeeded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub task_id: String,
}

/// Returned by `GET /status/{task_id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskStatus {
    pub task_id: String,
    pub status: JobState,
    pub error: Option<String>,
}

impl TaskStatus {
    pub fn from_record(task_id: impl Into<String>, record: &JobRecord) -> Self {
        Self {
            task_id: task_id.into(),
            status: record.status,
            error: record.error.clone(),
        }
    }
}

/// One entry of `GET /jobs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSummary {
    pub task_id: String,
    #[serde(flatten)]
    pub record: JobRecord,
}
