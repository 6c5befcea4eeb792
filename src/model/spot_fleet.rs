//! Spot fleet worker groups and their root volumes

use super::UnknownVariant;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Provisioned IOPS bounds for `io1` volumes
pub const MIN_IOPS: u32 = 100;
pub const MAX_IOPS: u32 = 20000;

/// EBS volume class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeType {
    Standard,
    Gp2,
    Io1,
}

impl VolumeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VolumeType::Standard => "standard",
            VolumeType::Gp2 => "gp2",
            VolumeType::Io1 => "io1",
        }
    }
}

impl Default for VolumeType {
    fn default() -> Self {
        Self::Gp2
    }
}

impl FromStr for VolumeType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(VolumeType::Standard),
            "gp2" => Ok(VolumeType::Gp2),
            "io1" => Ok(VolumeType::Io1),
            other => Err(UnknownVariant::new("root volume type", other)),
        }
    }
}

impl fmt::Display for VolumeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RootVolumeError {
    #[error("invalid iops {iops} for volume type io1: must be within [{}, {}]", MIN_IOPS, MAX_IOPS)]
    IopsOutOfRange { iops: u32 },

    #[error("iops must be zero or omitted for volume type {volume_type} but was {iops}")]
    IopsNotSupported { volume_type: VolumeType, iops: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRootVolume")]
pub struct RootVolume {
    #[serde(rename = "type")]
    volume_type: VolumeType,

    /// Size in GiB
    size: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    iops: Option<u32>,
}

#[derive(Deserialize)]
struct RawRootVolume {
    #[serde(default, rename = "type")]
    volume_type: VolumeType,
    size: u32,
    #[serde(default)]
    iops: Option<u32>,
}

impl TryFrom<RawRootVolume> for RootVolume {
    type Error = RootVolumeError;

    fn try_from(raw: RawRootVolume) -> Result<Self, Self::Error> {
        Self::new(raw.volume_type, raw.size, raw.iops)
    }
}

impl RootVolume {
    /// Build a root volume, enforcing that IOPS are only provisioned for `io1`
    ///
    /// An `iops` of zero is treated the same as an absent value.
    pub fn new(volume_type: VolumeType, size: u32, iops: Option<u32>) -> Result<Self, RootVolumeError> {
        let iops = iops.filter(|&iops| iops != 0);

        match (volume_type, iops) {
            (VolumeType::Io1, Some(iops)) if (MIN_IOPS..=MAX_IOPS).contains(&iops) => {}
            (VolumeType::Io1, iops) => {
                return Err(RootVolumeError::IopsOutOfRange {
                    iops: iops.unwrap_or(0),
                });
            }
            (volume_type, Some(iops)) => {
                return Err(RootVolumeError::IopsNotSupported { volume_type, iops });
            }
            (_, None) => {}
        }

        Ok(Self {
            volume_type,
            size,
            iops,
        })
    }

    pub fn volume_type(&self) -> VolumeType {
        self.volume_type
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn iops(&self) -> Option<u32> {
        self.iops
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchSpecification {
    pub instance_type: String,
    pub weighted_capacity: u32,
    pub root_volume: RootVolume,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotFleet {
    pub target_capacity: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spot_price: Option<String>,

    pub launch_specifications: Vec<LaunchSpecification>,
}

impl SpotFleet {
    /// Total weighted capacity a single instance of every launch spec would provide
    pub fn weighted_capacity(&self) -> u32 {
        self.launch_specifications
            .iter()
            .map(|spec| spec.weighted_capacity)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_type_parse() {
        assert_eq!("io1".parse::<VolumeType>().unwrap(), VolumeType::Io1);
        let err = "foo".parse::<VolumeType>().unwrap_err();
        assert_eq!(err.to_string(), "invalid root volume type: foo");
    }

    #[test]
    fn test_io1_requires_iops_in_range() {
        assert!(RootVolume::new(VolumeType::Io1, 30, Some(100)).is_ok());
        assert!(RootVolume::new(VolumeType::Io1, 30, Some(20000)).is_ok());
        assert_eq!(
            RootVolume::new(VolumeType::Io1, 30, Some(50)),
            Err(RootVolumeError::IopsOutOfRange { iops: 50 })
        );
        assert_eq!(
            RootVolume::new(VolumeType::Io1, 30, Some(20001)),
            Err(RootVolumeError::IopsOutOfRange { iops: 20001 })
        );
        assert_eq!(
            RootVolume::new(VolumeType::Io1, 30, None),
            Err(RootVolumeError::IopsOutOfRange { iops: 0 })
        );
    }

    #[test]
    fn test_iops_rejected_for_other_types() {
        // in range but still invalid, iops only apply to io1
        assert_eq!(
            RootVolume::new(VolumeType::Gp2, 30, Some(1000)),
            Err(RootVolumeError::IopsNotSupported {
                volume_type: VolumeType::Gp2,
                iops: 1000
            })
        );
        let volume = RootVolume::new(VolumeType::Standard, 30, Some(0)).unwrap();
        assert_eq!(volume.iops(), None);
    }

    #[test]
    fn test_deserialize_enforces_iops_rules() {
        let volume: RootVolume = serde_yaml::from_str("type: io1\nsize: 50\niops: 1000\n").unwrap();
        assert_eq!(volume.iops(), Some(1000));

        let err = serde_yaml::from_str::<RootVolume>("type: gp2\nsize: 30\niops: 1000\n").unwrap_err();
        assert!(err.to_string().contains("iops must be zero or omitted for volume type gp2"));

        assert!(serde_yaml::from_str::<RootVolume>("type: io1\nsize: 30\n").is_err());
    }

    #[test]
    fn test_weighted_capacity() {
        let volume = RootVolume::new(VolumeType::Gp2, 30, None).unwrap();
        let fleet = SpotFleet {
            target_capacity: 10,
            spot_price: None,
            launch_specifications: vec![
                LaunchSpecification {
                    instance_type: "c4.large".to_string(),
                    weighted_capacity: 1,
                    root_volume: volume.clone(),
                },
                LaunchSpecification {
                    instance_type: "c4.xlarge".to_string(),
                    weighted_capacity: 2,
                    root_volume: volume,
                },
            ],
        };
        assert_eq!(fleet.weighted_capacity(), 3);
    }
}
