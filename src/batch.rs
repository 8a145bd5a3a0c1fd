//! Run a directory of request envelopes in parallel.
//!
//! Every `*.json` file under the directory is one request. Its response body
//! is written to `<stem>.response.json`, either next to the request or at the
//! same relative path under an output directory. Requests run on the rayon
//! pool; each gets its own staging directory, so nothing is shared between
//! them but the backend.
//!
//! A request that fails is still a completed batch item (its response holds
//! the error message). Only I/O on the response files aborts the batch.

use crate::imaging::ImageBackend;
use crate::service::{EditResponse, EditorService, RequestError, ResponseBody};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Suffix of the files the batch writes; never read back as requests.
pub const RESPONSE_SUFFIX: &str = ".response.json";

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Outcome of one request file.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchItem {
    pub request: PathBuf,
    pub response: PathBuf,
    pub status: u16,
    /// Error message for failed requests.
    pub error: Option<String>,
}

impl BatchItem {
    pub fn succeeded(&self) -> bool {
        self.status == 200
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    /// Items in request path order.
    pub items: Vec<BatchItem>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.items.iter().filter(|i| i.succeeded()).count()
    }

    pub fn failed(&self) -> usize {
        self.items.len() - self.succeeded()
    }
}

fn is_request_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.ends_with(".json") && !name.ends_with(RESPONSE_SUFFIX)
}

/// All request files under `dir`, sorted by path.
pub fn collect_requests(dir: &Path) -> Result<Vec<PathBuf>, BatchError> {
    let mut requests = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() && is_request_file(entry.path()) {
            requests.push(entry.into_path());
        }
    }
    Ok(requests)
}

/// Where the response for `request` goes.
pub fn response_path(request: &Path, root: &Path, out: Option<&Path>) -> PathBuf {
    let stem = request
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let file_name = format!("{stem}{RESPONSE_SUFFIX}");
    match out {
        Some(out) => {
            let relative = request.strip_prefix(root).unwrap_or(request);
            out.join(relative).with_file_name(file_name)
        }
        None => request.with_file_name(file_name),
    }
}

fn run_one<B: ImageBackend>(
    service: &EditorService<B>,
    request: &Path,
    root: &Path,
    out: Option<&Path>,
) -> Result<BatchItem, BatchError> {
    let response = match fs::read_to_string(request) {
        Ok(body) => service.handle_json(&body),
        Err(e) => EditResponse::from_error(&RequestError::Internal(format!(
            "reading {}: {e}",
            request.display()
        ))),
    };
    let target = response_path(request, root, out);
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&target, serde_json::to_string_pretty(&response.body)?)?;
    debug!(request = %request.display(), status = response.status, "batch item done");

    let error = match &response.body {
        ResponseBody::Failure { error_message } => Some(error_message.clone()),
        ResponseBody::Success { .. } => None,
    };
    Ok(BatchItem {
        request: request.to_path_buf(),
        response: target,
        status: response.status,
        error,
    })
}

/// Run every request under `dir` in parallel on the current rayon pool.
pub fn run_batch<B: ImageBackend>(
    service: &EditorService<B>,
    dir: &Path,
    out: Option<&Path>,
) -> Result<BatchReport, BatchError> {
    let requests = collect_requests(dir)?;
    info!(dir = %dir.display(), count = requests.len(), "running batch");

    let items = requests
        .par_iter()
        .map(|request| run_one(service, request, dir, out))
        .collect::<Result<Vec<_>, _>>()?;

    let report = BatchReport { items };
    info!(
        succeeded = report.succeeded(),
        failed = report.failed(),
        "batch finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::RustBackend;
    use crate::staging::StagingArea;
    use crate::test_helpers::{envelope, gradient_rgba, png_bytes};
    use serde_json::json;
    use tempfile::TempDir;

    fn write_request(dir: &Path, name: &str, body: &serde_json::Value) {
        let path = dir.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, serde_json::to_string(body).unwrap()).unwrap();
    }

    #[test]
    fn collect_skips_responses_and_other_files() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("b.json"), "{}").unwrap();
        fs::write(tmp.path().join("a.json"), "{}").unwrap();
        fs::write(tmp.path().join("a.response.json"), "{}").unwrap();
        fs::write(tmp.path().join("notes.txt"), "").unwrap();

        let found = collect_requests(tmp.path()).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.json", "b.json"]);
    }

    #[test]
    fn response_path_next_to_request_or_mirrored() {
        let root = Path::new("/jobs");
        let request = Path::new("/jobs/nested/edit.json");
        assert_eq!(
            response_path(request, root, None),
            PathBuf::from("/jobs/nested/edit.response.json")
        );
        assert_eq!(
            response_path(request, root, Some(Path::new("/out"))),
            PathBuf::from("/out/nested/edit.response.json")
        );
    }

    #[test]
    fn batch_writes_one_response_per_request() {
        let jobs = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let staging = TempDir::new().unwrap();
        let image = png_bytes(&gradient_rgba(20, 10));

        write_request(
            jobs.path(),
            "half.json",
            &envelope(
                &image,
                json!("png"),
                json!({"resize": {"resizeByPercentage": {"percentage": 50}}}),
            ),
        );
        write_request(
            jobs.path(),
            "deep/bad.json",
            &envelope(&image, json!("png"), json!({"warp": {"warp": null}})),
        );
        fs::write(jobs.path().join("broken.json"), "{ nope").unwrap();

        let service = EditorService::new(RustBackend::new(), StagingArea::new(staging.path()));
        let report = run_batch(&service, jobs.path(), Some(out.path())).unwrap();

        assert_eq!(report.items.len(), 3);
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 2);
        assert!(out.path().join("half.response.json").exists());
        assert!(out.path().join("deep/bad.response.json").exists());

        let body: serde_json::Value = serde_json::from_str(
            &fs::read_to_string(out.path().join("deep/bad.response.json")).unwrap(),
        )
        .unwrap();
        assert!(body["errorMessage"].as_str().unwrap().contains("warp"));
        assert_eq!(fs::read_dir(staging.path()).unwrap().count(), 0);
    }
}
