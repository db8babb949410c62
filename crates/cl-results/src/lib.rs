//! cl-results: tab-separated loop results and run manifests.

pub mod hash;
pub mod manifest;
pub mod writer;

pub use hash::compute_run_id;
pub use manifest::{InitialSummary, RunManifest, load_manifest, manifest_path, save_manifest};
pub use writer::{COLUMNS, read_results, write_results};

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed results file {path} at line {line}: {message}")]
    Parse {
        path: String,
        line: usize,
        message: String,
    },
}
