//! Run manifest written next to the results file.

use crate::ResultsResult;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InitialSummary {
    pub temperature: f64,
    pub density: f64,
    pub iterations: usize,
    pub converged: bool,
    pub relative_error: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunManifest {
    pub run_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub timestamp: String,
    pub solver: String,
    pub solver_version: String,
    pub rows: usize,
    pub final_time: f64,
    pub adaptive_failures: usize,
    pub trim_count: usize,
    pub initial: InitialSummary,
    pub output_filename: String,
}

impl RunManifest {
    /// Stamp a manifest with the current UTC time.
    pub fn stamp(mut self) -> Self {
        self.timestamp = chrono::Utc::now().to_rfc3339();
        self
    }
}

/// `<output>.manifest.json`
pub fn manifest_path(output: &Path) -> PathBuf {
    let mut name = output.as_os_str().to_os_string();
    name.push(".manifest.json");
    PathBuf::from(name)
}

pub fn save_manifest(output: &Path, manifest: &RunManifest) -> ResultsResult<PathBuf> {
    let path = manifest_path(output);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(manifest)?;
    fs::write(&path, json)?;
    Ok(path)
}

pub fn load_manifest(output: &Path) -> ResultsResult<RunManifest> {
    let content = fs::read_to_string(manifest_path(output))?;
    Ok(serde_json::from_str(&content)?)
}
