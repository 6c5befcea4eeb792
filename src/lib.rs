//! kube-aws configuration library
//!
//! Parses a cluster's `cluster.yaml`, then merges and validates each node
//! pool's configuration against it.

pub mod commands;
pub mod config;
pub mod model;
pub mod utils;

pub use config::cluster::parse_cluster_configuration;
pub use config::nodepool::parse_node_pool_configuration;
pub use config::{ClusterConfiguration, ConfigError, NodePoolConfiguration};
pub use model::PodResources;
