//! Process one upload end to end and record its outcome.

use std::fs;

use super::{JobRecord, JobStore};
use crate::api::logs::{log_task_error, log_task_info, log_task_success, log_task_warning};
use crate::config::StorageLayout;
use crate::transform::{Pipeline, PipelineOptions};

/// Store the upload, run the pipeline and record the result.
///
/// Never fails: pipeline and I/O errors end up in the returned (and stored)
/// record as `failed`. Errors of the store itself are logged.
pub fn run_job(
    layout: &StorageLayout,
    store: &dyn JobStore,
    options: &PipelineOptions,
    task_id: &str,
    file_name: Option<&str>,
    bytes: &[u8],
) -> JobRecord {
    let record = JobRecord::pending(file_name.map(String::from));
    persist(store, task_id, &record);

    log_task_info(
        task_id,
        format!(
            "Received {} ({} bytes)",
            file_name.unwrap_or("unnamed upload"),
            bytes.len()
        ),
    );

    let input = layout.input_path(task_id, file_name);
    let output = layout.output_path(task_id);

    let record = match layout.ensure_dirs().and_then(|_| fs::write(&input, bytes)) {
        Err(e) => {
            log_task_error(task_id, format!("Cannot store upload: {}", e));
            record.fail(format!("Cannot store upload: {}", e))
        }
        Ok(()) => {
            let mut pipeline = Pipeline::new(options.clone());
            match pipeline.run(&input, &output) {
                Ok(summary) => {
                    log_task_info(task_id, format!("Columns: {}", summary.columns.join(", ")));
                    if !summary.annotated {
                        log_task_warning(task_id, "Quantity columns missing, rows kept unfiltered");
                    }
                    log_task_success(
                        task_id,
                        format!(
                            "{} of {} rows kept",
                            summary.retained_rows, summary.loaded_rows
                        ),
                    );
                    record.succeed(summary.retained_rows)
                }
                Err(e) => {
                    log_task_error(task_id, format!("Processing failed: {}", e));
                    record.fail(e.to_string())
                }
            }
        }
    };

    persist(store, task_id, &record);
    record
}

fn persist(store: &dyn JobStore, task_id: &str, record: &JobRecord) {
    if let Err(e) = store.set(task_id, record.clone()) {
        log_task_error(task_id, format!("Cannot record job status: {}", e));
    }
}
