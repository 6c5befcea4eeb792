//! Value types shared by the cluster and node pool configuration models

pub mod network;
pub mod pod_resources;
pub mod spot_fleet;
pub mod taint;

pub use network::{CidrParseError, Ipv4Cidr};
pub use pod_resources::PodResources;
pub use spot_fleet::{LaunchSpecification, RootVolume, RootVolumeError, SpotFleet, VolumeType};
pub use taint::{Taint, TaintEffect};

use thiserror::Error;

/// A string that does not name any variant of a closed set
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    pub fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}
