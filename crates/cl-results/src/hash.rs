//! Content-based hashing for run IDs.

use cl_project::LoopConfig;
use sha2::{Digest, Sha256};

/// SHA-256 over the canonical JSON form of the configuration and the solver version.
pub fn compute_run_id(config: &LoopConfig, solver_version: &str) -> String {
    let mut hasher = Sha256::new();

    let config_json = serde_json::to_string(config).unwrap_or_default();
    hasher.update(config_json.as_bytes());

    hasher.update(solver_version.as_bytes());

    let result = hasher.finalize();
    format!("{:x}", result)
}
