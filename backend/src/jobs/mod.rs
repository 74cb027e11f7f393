//! Job registry - status of every processed upload.
//!
//! The registry sits behind the [`JobStore`] trait so handlers and tests can
//! swap the JSON file for an in-memory map.

pub mod runner;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use crate::error::StoreResult;
use crate::transform::Stage;

pub use runner::run_job;

/// Lifecycle of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Pending,
    Success,
    Failed,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Success => "success",
            JobState::Failed => "failed",
        }
    }
}

/// A stored job with metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    /// Current state
    pub status: JobState,
    /// Failure message, set when `status` is `failed`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Original name of the uploaded file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Last pipeline stage reached
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
    /// Rows written to the result, on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retained_rows: Option<usize>,
    /// Creation timestamp (RFC 3339)
    #[serde(default)]
    pub created_at: String,
    /// Last update timestamp (RFC 3339)
    #[serde(default)]
    pub updated_at: String,
}

impl JobRecord {
    /// A fresh pending job.
    pub fn pending(file_name: Option<String>) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            status: JobState::Pending,
            error: None,
            file_name,
            stage: None,
            retained_rows: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Mark as succeeded.
    pub fn succeed(mut self, retained_rows: usize) -> Self {
        self.status = JobState::Success;
        self.error = None;
        self.stage = Some(Stage::Saved);
        self.retained_rows = Some(retained_rows);
        self.touch()
    }

    /// Mark as failed with the given message.
    pub fn fail(mut self, error: impl Into<String>) -> Self {
        self.status = JobState::Failed;
        self.error = Some(error.into());
        self.stage = Some(Stage::Failed);
        self.touch()
    }

    fn touch(mut self) -> Self {
        self.updated_at = chrono::Utc::now().to_rfc3339();
        self
    }
}

/// Storage for job records, keyed by task id.
///
/// Implementations must be safe to share between concurrent requests.
pub trait JobStore: Send + Sync {
    fn get(&self, task_id: &str) -> StoreResult<Option<JobRecord>>;

    fn set(&self, task_id: &str, record: JobRecord) -> StoreResult<()>;

    /// All jobs, ordered by task id.
    fn list(&self) -> StoreResult<Vec<(String, JobRecord)>>;
}

// =============================================================================
// File-backed store
// =============================================================================

/// Job records in one pretty-printed JSON object on disk.
///
/// Every `set` re-reads the file, updates one entry and rewrites it while
/// holding the store's lock.
pub struct FileJobStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileJobStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> StoreResult<BTreeMap<String, JobRecord>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self, jobs: &BTreeMap<String, JobRecord>) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(jobs)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

impl JobStore for FileJobStore {
    fn get(&self, task_id: &str) -> StoreResult<Option<JobRecord>> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        Ok(self.load()?.remove(task_id))
    }

    fn set(&self, task_id: &str, record: JobRecord) -> StoreResult<()> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut jobs = self.load()?;
        jobs.insert(task_id.to_string(), record);
        self.save(&jobs)
    }

    fn list(&self) -> StoreResult<Vec<(String, JobRecord)>> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        Ok(self.load()?.into_iter().collect())
    }
}

// =============================================================================
// In-memory store
// =============================================================================

/// Job records kept in process memory.
#[derive(Default)]
pub struct MemoryJobStore {
    jobs: RwLock<BTreeMap<String, JobRecord>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl JobStore for MemoryJobStore {
    fn get(&self, task_id: &str) -> StoreResult<Option<JobRecord>> {
        let jobs = self.jobs.read().unwrap_or_else(|e| e.into_inner());
        Ok(jobs.get(task_id).cloned())
    }

    fn set(&self, task_id: &str, record: JobRecord) -> StoreResult<()> {
        let mut jobs = self.jobs.write().unwrap_or_else(|e| e.into_inner());
        jobs.insert(task_id.to_string(), record);
        Ok(())
    }

    fn list(&self) -> StoreResult<Vec<(String, JobRecord)>> {
        let jobs = self.jobs.read().unwrap_or_else(|e| e.into_inner());
        Ok(jobs.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }
}
