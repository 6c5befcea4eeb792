//! Node pool configuration, parsed in the context of its cluster

use super::cluster::ClusterConfiguration;
use super::error::{ConfigError, Document};
use super::inheritance::{self, Declared};
use super::{non_empty, validation};
use crate::model::{Ipv4Cidr, PodResources, SpotFleet, Taint};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::sync::LazyLock;

/// Subnet used for worker instances when the node pool does not declare one
pub const DEFAULT_INSTANCE_CIDR: Ipv4Cidr = Ipv4Cidr::from_octets([10, 0, 1, 0], 24);

/// Root volume size in GiB when a launch specification omits it
pub const DEFAULT_ROOT_VOLUME_SIZE: u32 = 30;

// Node pool names end up in stack and resource names
static NODE_POOL_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z][-a-zA-Z0-9]*$").expect("node pool name pattern is valid")
});

/// A node pool's `cluster.yaml` as written by the user
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePoolSpec {
    #[serde(default)]
    pub cluster_name: Option<String>,

    #[serde(default, alias = "name")]
    pub node_pool_name: Option<String>,

    #[serde(default, rename = "externalDNSName")]
    pub external_dns_name: Option<String>,

    #[serde(default)]
    pub key_name: Option<String>,

    #[serde(default)]
    pub availability_zone: Option<String>,

    #[serde(default, rename = "dnsServiceIP")]
    pub dns_service_ip: Option<String>,

    /// Comma separated list of etcd hosts
    #[serde(default)]
    pub etcd_endpoints: Option<String>,

    #[serde(default)]
    pub vpc_id: Option<String>,

    #[serde(default, rename = "vpcCIDR")]
    pub vpc_cidr: Option<String>,

    #[serde(default, rename = "instanceCIDR")]
    pub instance_cidr: Option<String>,

    #[serde(default)]
    pub security_group_ids: Vec<String>,

    #[serde(default)]
    pub load_balancer: LoadBalancer,

    #[serde(default)]
    pub target_group: TargetGroup,

    #[serde(default)]
    pub taints: Vec<TaintSpec>,

    #[serde(default)]
    pub spot_fleet: Option<SpotFleetSpec>,

    #[serde(default)]
    pub kube_reserved_resources: Option<PodResources>,

    #[serde(default)]
    pub system_reserved_resources: Option<PodResources>,

    // Only read to reject per node pool overrides
    #[serde(default)]
    pub region: Option<String>,

    #[serde(default)]
    pub kms_key_arn: Option<String>,
}

/// Classic ELBs the workers register with
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancer {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub names: Vec<String>,

    #[serde(default)]
    pub security_group_ids: Vec<String>,
}

/// ALB target groups the workers register with
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetGroup {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub arns: Vec<String>,

    #[serde(default)]
    pub security_group_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaintSpec {
    #[serde(default)]
    pub key: String,

    #[serde(default)]
    pub value: String,

    #[serde(default)]
    pub effect: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotFleetSpec {
    #[serde(default)]
    pub target_capacity: u32,

    #[serde(default)]
    pub spot_price: Option<String>,

    #[serde(default)]
    pub launch_specifications: Vec<LaunchSpecificationSpec>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchSpecificationSpec {
    #[serde(default)]
    pub instance_type: String,

    #[serde(default)]
    pub weighted_capacity: u32,

    #[serde(default)]
    pub root_volume: RootVolumeSpec,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RootVolumeSpec {
    #[serde(default, rename = "type")]
    pub volume_type: Option<String>,

    #[serde(default)]
    pub size: Option<u32>,

    #[serde(default)]
    pub iops: Option<u32>,
}

/// A node pool after inheritance and defaulting, before semantic validation
///
/// Enum-like fields are still raw strings here; the validator pipeline is
/// what turns them into closed types.
#[derive(Debug, Clone)]
pub struct MergedNodePool {
    pub cluster_name: String,
    pub node_pool_name: String,
    pub external_dns_name: Option<String>,
    pub key_name: Option<String>,
    pub region: String,
    pub kms_key_arn: Option<String>,
    pub availability_zone: Option<String>,
    pub dns_service_ip: Ipv4Addr,
    pub etcd_endpoints: Vec<String>,
    pub vpc_id: Option<String>,
    /// Declared at either scope; `None` means the default block applies
    pub vpc_cidr: Option<Ipv4Cidr>,
    pub instance_cidr: Ipv4Cidr,
    pub security_group_ids: Vec<String>,
    pub load_balancer: LoadBalancer,
    pub target_group: TargetGroup,
    pub taints: Vec<TaintSpec>,
    pub spot_fleet: Option<SpotFleetSpec>,
    pub kube_reserved_resources: Option<PodResources>,
    pub system_reserved_resources: Option<PodResources>,
}

impl MergedNodePool {
    /// Apply inheritance and node pool defaults to a decoded document
    pub fn new(spec: NodePoolSpec, parent: &ClusterConfiguration) -> Result<Self, ConfigError> {
        let inherited = inheritance::merge(
            parent,
            Declared {
                region: spec.region.as_deref(),
                kms_key_arn: spec.kms_key_arn.as_deref(),
                availability_zone: spec.availability_zone.as_deref(),
                vpc_id: spec.vpc_id.as_deref(),
                vpc_cidr: spec.vpc_cidr.as_deref(),
            },
        )?;

        let cluster_name = required(spec.cluster_name, "clusterName")?;
        let node_pool_name = required(spec.node_pool_name, "nodePoolName")?;
        if !NODE_POOL_NAME.is_match(&node_pool_name) {
            return Err(ConfigError::schema(
                Document::NodePool,
                "nodePoolName",
                format!(
                    "must start with a letter and contain only letters, digits and hyphens but was \"{}\"",
                    node_pool_name
                ),
            ));
        }

        let dns_service_ip = required(spec.dns_service_ip, "dnsServiceIP")?;
        let dns_service_ip = dns_service_ip.parse::<Ipv4Addr>().map_err(|_| {
            ConfigError::schema(
                Document::NodePool,
                "dnsServiceIP",
                format!("must be an IPv4 address but was \"{}\"", dns_service_ip),
            )
        })?;

        let etcd_endpoints: Vec<String> = required(spec.etcd_endpoints, "etcdEndpoints")?
            .split(',')
            .map(str::trim)
            .filter(|endpoint| !endpoint.is_empty())
            .map(str::to_string)
            .collect();
        if etcd_endpoints.is_empty() {
            return Err(ConfigError::schema(
                Document::NodePool,
                "etcdEndpoints",
                "must list at least one endpoint",
            ));
        }

        let vpc_cidr = inherited
            .vpc_cidr
            .map(|cidr| parse_cidr(&cidr, "vpcCIDR"))
            .transpose()?;
        let instance_cidr = non_empty(spec.instance_cidr)
            .map(|cidr| parse_cidr(&cidr, "instanceCIDR"))
            .transpose()?
            .unwrap_or(DEFAULT_INSTANCE_CIDR);

        Ok(Self {
            cluster_name,
            node_pool_name,
            external_dns_name: non_empty(spec.external_dns_name),
            key_name: non_empty(spec.key_name),
            region: inherited.region,
            kms_key_arn: inherited.kms_key_arn,
            availability_zone: inherited.availability_zone,
            dns_service_ip,
            etcd_endpoints,
            vpc_id: inherited.vpc_id,
            vpc_cidr,
            instance_cidr,
            security_group_ids: spec.security_group_ids,
            load_balancer: spec.load_balancer,
            target_group: spec.target_group,
            taints: spec.taints,
            spot_fleet: spec.spot_fleet,
            kube_reserved_resources: spec.kube_reserved_resources,
            system_reserved_resources: spec.system_reserved_resources,
        })
    }

    /// Security groups the user attached to workers, load balancers and target groups
    ///
    /// Load balancer and target group lists only count while those are enabled.
    pub fn user_security_group_ids(&self) -> impl Iterator<Item = &str> {
        let load_balancer = self
            .load_balancer
            .enabled
            .then_some(&self.load_balancer.security_group_ids);
        let target_group = self
            .target_group
            .enabled
            .then_some(&self.target_group.security_group_ids);

        self.security_group_ids
            .iter()
            .chain(load_balancer.into_iter().flatten())
            .chain(target_group.into_iter().flatten())
            .map(String::as_str)
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, ConfigError> {
    non_empty(value).ok_or_else(|| ConfigError::schema(Document::NodePool, field, "must be set"))
}

fn parse_cidr(value: &str, field: &str) -> Result<Ipv4Cidr, ConfigError> {
    value
        .parse()
        .map_err(|e: crate::model::CidrParseError| ConfigError::schema(Document::NodePool, field, e.to_string()))
}

/// Fully merged and validated node pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePoolConfiguration {
    pub cluster_name: String,
    pub node_pool_name: String,

    #[serde(rename = "externalDNSName", skip_serializing_if = "Option::is_none")]
    pub external_dns_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_name: Option<String>,

    pub region: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub kms_key_arn: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability_zone: Option<String>,

    #[serde(rename = "dnsServiceIP")]
    pub dns_service_ip: Ipv4Addr,

    pub etcd_endpoints: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub vpc_id: Option<String>,

    #[serde(rename = "vpcCIDR")]
    pub vpc_cidr: Ipv4Cidr,

    #[serde(rename = "instanceCIDR")]
    pub instance_cidr: Ipv4Cidr,

    pub security_group_ids: Vec<String>,
    pub load_balancer: LoadBalancer,
    pub target_group: TargetGroup,
    pub taints: Vec<Taint>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub spot_fleet: Option<SpotFleet>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub kube_reserved_resources: Option<PodResources>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_reserved_resources: Option<PodResources>,
}

impl NodePoolConfiguration {
    /// Parse a node pool document, merge it with its cluster and validate the result
    ///
    /// Stops at the first failure; no partially built configuration is returned.
    pub fn parse(bytes: &[u8], parent: &ClusterConfiguration) -> Result<Self, ConfigError> {
        let spec: NodePoolSpec = super::decode(Document::NodePool, bytes)?;
        let merged = MergedNodePool::new(spec, parent)?;
        tracing::debug!(node_pool = %merged.node_pool_name, "merged node pool with cluster");

        let node_pool_name = merged.node_pool_name.clone();
        let config = validation::run(merged).map_err(|violation| {
            tracing::debug!(node_pool = %node_pool_name, rule = %violation.rule, "node pool failed validation");
            ConfigError::report(node_pool_name, violation)
        })?;

        Ok(config)
    }

    pub fn is_spot_fleet(&self) -> bool {
        self.spot_fleet.is_some()
    }
}

/// Parse a node pool document against an already parsed cluster
pub fn parse_node_pool_configuration(
    bytes: &[u8],
    parent: &ClusterConfiguration,
) -> Result<NodePoolConfiguration, ConfigError> {
    NodePoolConfiguration::parse(bytes, parent)
}
