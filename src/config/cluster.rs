//! Cluster-wide configuration shared by every node pool

use super::error::{ConfigError, Document};
use super::non_empty;
use crate::model::Ipv4Cidr;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// VPC block used when the cluster does not declare one
pub const DEFAULT_VPC_CIDR: Ipv4Cidr = Ipv4Cidr::from_octets([10, 0, 0, 0], 16);

/// `cluster.yaml` as written by the user
///
/// Fields outside the ones validated here are accepted and ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClusterSpec {
    #[serde(default)]
    region: Option<String>,

    #[serde(default)]
    availability_zone: Option<String>,

    #[serde(default)]
    api_endpoints: Vec<ApiEndpointSpec>,

    #[serde(default)]
    ssh_authorized_keys: Vec<String>,

    #[serde(default)]
    kms_key_arn: Option<String>,

    #[serde(default)]
    vpc_id: Option<String>,

    #[serde(default, rename = "vpcCIDR")]
    vpc_cidr: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEndpointSpec {
    #[serde(default)]
    name: String,

    #[serde(default)]
    dns_name: String,

    #[serde(default)]
    load_balancer: Option<ApiEndpointLoadBalancerSpec>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEndpointLoadBalancerSpec {
    #[serde(default)]
    hosted_zone: Option<HostedZoneSpec>,

    #[serde(default)]
    private: bool,

    #[serde(default)]
    record_set_managed: Option<bool>,

    #[serde(default)]
    security_group_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct HostedZoneSpec {
    #[serde(default)]
    id: Option<String>,
}

/// A named Kubernetes API endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEndpoint {
    pub name: String,
    pub dns_name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_balancer: Option<ApiEndpointLoadBalancer>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEndpointLoadBalancer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hosted_zone_id: Option<String>,
    pub private: bool,
    pub record_set_managed: bool,
    pub security_group_ids: Vec<String>,
}

/// Validated cluster configuration
///
/// Built once per invocation and only ever read afterwards, so it can be
/// shared between threads validating different node pools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterConfiguration {
    pub region: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability_zone: Option<String>,

    pub api_endpoints: Vec<ApiEndpoint>,
    pub ssh_authorized_keys: BTreeSet<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub kms_key_arn: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub vpc_id: Option<String>,

    /// Only set when the user declared it, see [`ClusterConfiguration::effective_vpc_cidr`]
    #[serde(rename = "vpcCIDR", skip_serializing_if = "Option::is_none")]
    pub vpc_cidr: Option<Ipv4Cidr>,
}

impl ClusterConfiguration {
    /// Parse and validate a cluster configuration document
    pub fn parse(bytes: &[u8]) -> Result<Self, ConfigError> {
        let spec: ClusterSpec = super::decode(Document::Cluster, bytes)?;
        let config = Self::from_spec(spec)?;

        tracing::debug!(
            region = %config.region,
            api_endpoints = config.api_endpoints.len(),
            "parsed cluster configuration"
        );
        Ok(config)
    }

    fn from_spec(spec: ClusterSpec) -> Result<Self, ConfigError> {
        let region = non_empty(spec.region)
            .ok_or_else(|| ConfigError::schema(Document::Cluster, "region", "must be set"))?;

        let api_endpoints = validate_api_endpoints(spec.api_endpoints)?;

        let vpc_cidr = non_empty(spec.vpc_cidr)
            .map(|cidr| {
                cidr.parse::<Ipv4Cidr>()
                    .map_err(|e| ConfigError::schema(Document::Cluster, "vpcCIDR", e.to_string()))
            })
            .transpose()?;

        let ssh_authorized_keys = spec
            .ssh_authorized_keys
            .into_iter()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .collect();

        Ok(Self {
            region,
            availability_zone: non_empty(spec.availability_zone),
            api_endpoints,
            ssh_authorized_keys,
            kms_key_arn: non_empty(spec.kms_key_arn),
            vpc_id: non_empty(spec.vpc_id),
            vpc_cidr,
        })
    }

    /// The declared VPC block, or the default one
    pub fn effective_vpc_cidr(&self) -> Ipv4Cidr {
        self.vpc_cidr.unwrap_or(DEFAULT_VPC_CIDR)
    }

    pub fn api_endpoint(&self, name: &str) -> Option<&ApiEndpoint> {
        self.api_endpoints.iter().find(|endpoint| endpoint.name == name)
    }
}

fn validate_api_endpoints(specs: Vec<ApiEndpointSpec>) -> Result<Vec<ApiEndpoint>, ConfigError> {
    if specs.is_empty() {
        return Err(ConfigError::schema(
            Document::Cluster,
            "apiEndpoints",
            "must contain at least one endpoint",
        ));
    }

    let mut seen = HashSet::new();
    let mut endpoints = Vec::with_capacity(specs.len());

    for (i, spec) in specs.into_iter().enumerate() {
        let name = spec.name.trim().to_string();
        if name.is_empty() {
            return Err(ConfigError::schema(
                Document::Cluster,
                format!("apiEndpoints[{}].name", i),
                "must be set",
            ));
        }
        if !seen.insert(name.clone()) {
            return Err(ConfigError::schema(
                Document::Cluster,
                format!("apiEndpoints[{}].name", i),
                format!("duplicates the endpoint name \"{}\"", name),
            ));
        }

        let dns_name = spec.dns_name.trim().to_string();
        if dns_name.is_empty() {
            return Err(ConfigError::schema(
                Document::Cluster,
                format!("apiEndpoints[{}].dnsName", i),
                "must be set",
            ));
        }

        let load_balancer = spec
            .load_balancer
            .map(|lb| {
                let hosted_zone_id = non_empty(lb.hosted_zone.and_then(|zone| zone.id));
                let record_set_managed = lb.record_set_managed.unwrap_or(true);
                if record_set_managed && hosted_zone_id.is_none() {
                    return Err(ConfigError::schema(
                        Document::Cluster,
                        format!("apiEndpoints[{}].loadBalancer.hostedZone.id", i),
                        "must be set when recordSetManaged is true",
                    ));
                }
                Ok(ApiEndpointLoadBalancer {
                    hosted_zone_id,
                    private: lb.private,
                    record_set_managed,
                    security_group_ids: lb.security_group_ids,
                })
            })
            .transpose()?;

        endpoints.push(ApiEndpoint {
            name,
            dns_name,
            load_balancer,
        });
    }

    Ok(endpoints)
}

/// Parse a cluster configuration document
pub fn parse_cluster_configuration(bytes: &[u8]) -> Result<ClusterConfiguration, ConfigError> {
    ClusterConfiguration::parse(bytes)
}
