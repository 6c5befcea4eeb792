//! Utility modules for kube-aws

pub mod errors;
pub mod logger;
pub mod paths;

// Re-export commonly used items
pub use errors::{KubeAwsError, display_error_and_exit, enhance_error};
pub use logger::{log_error, log_info, log_warn};
pub use paths::{discover_node_pools, read_config};
