//! CPU and memory quantities reserved for system daemons

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static CPU_QUANTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+m$").expect("cpu quantity pattern is valid"));

static MEMORY_QUANTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+(Mi|Gi)$").expect("memory quantity pattern is valid"));

/// A pair of Kubernetes resource quantities
///
/// Only millicores are accepted for `cpu` and only `Mi`/`Gi` for `memory`.
/// The whole string has to match: `"x100m"` is rejected even though it ends
/// with a valid quantity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodResources {
    #[serde(default)]
    pub cpu: String,

    #[serde(default)]
    pub memory: String,
}

impl PodResources {
    pub fn new(cpu: impl Into<String>, memory: impl Into<String>) -> Self {
        Self {
            cpu: cpu.into(),
            memory: memory.into(),
        }
    }

    /// Check that both quantities are well formed
    pub fn is_valid(&self) -> bool {
        CPU_QUANTITY.is_match(&self.cpu) && MEMORY_QUANTITY.is_match(&self.memory)
    }
}
