//! Locating cluster and node pool configuration files

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// File name each node pool directory is expected to contain
pub const NODE_POOL_CONFIG_FILE: &str = "cluster.yaml";

/// Find every `<dir>/<pool>/cluster.yaml`, sorted by path
///
/// A missing directory means the cluster has no node pools.
pub fn discover_node_pools(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        tracing::debug!(dir = %dir.display(), "node pools directory does not exist");
        return Ok(Vec::new());
    }

    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read node pools directory: {}", dir.display()))?;

    let mut found = Vec::new();
    for entry in entries {
        let entry = entry
            .with_context(|| format!("Failed to read node pools directory: {}", dir.display()))?;
        let candidate = entry.path().join(NODE_POOL_CONFIG_FILE);
        if candidate.is_file() {
            found.push(candidate);
        }
    }

    found.sort();
    Ok(found)
}

/// Read a configuration file into memory
pub fn read_config(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("Failed to read config file: {}", path.display()))
}
