//! Semantic checks run against a merged node pool
//!
//! The checks run in a fixed order and the first failure wins. Each check
//! either returns the typed form of the fields it owns or a [`Violation`].

use super::cluster::DEFAULT_VPC_CIDR;
use super::error::{Rule, Violation};
use super::nodepool::{
    DEFAULT_ROOT_VOLUME_SIZE, MergedNodePool, NodePoolConfiguration, SpotFleetSpec, TaintSpec,
};
use crate::model::{
    Ipv4Cidr, LaunchSpecification, PodResources, RootVolume, SpotFleet, Taint, VolumeType,
};
use std::collections::BTreeSet;

/// EC2 allows five security groups per network interface and one is always
/// the group managed for the node pool itself
pub const MAX_USER_SECURITY_GROUPS: usize = 4;

/// Run every check in order and build the validated configuration
pub fn run(pool: MergedNodePool) -> Result<NodePoolConfiguration, Violation> {
    let taints = validate_taints(&pool.taints)?;
    tracing::trace!(node_pool = %pool.node_pool_name, "taints are valid");

    validate_network(pool.vpc_id.as_deref(), pool.vpc_cidr, pool.instance_cidr)?;
    tracing::trace!(node_pool = %pool.node_pool_name, "network layout is valid");

    validate_security_groups(&pool)?;
    tracing::trace!(node_pool = %pool.node_pool_name, "security group quota is respected");

    let spot_fleet = pool.spot_fleet.as_ref().map(validate_spot_fleet).transpose()?;
    tracing::trace!(node_pool = %pool.node_pool_name, "spot fleet is valid");

    validate_reserved_resources("kubeReservedResources", pool.kube_reserved_resources.as_ref())?;
    validate_reserved_resources("systemReservedResources", pool.system_reserved_resources.as_ref())?;

    Ok(NodePoolConfiguration {
        cluster_name: pool.cluster_name,
        node_pool_name: pool.node_pool_name,
        external_dns_name: pool.external_dns_name,
        key_name: pool.key_name,
        region: pool.region,
        kms_key_arn: pool.kms_key_arn,
        availability_zone: pool.availability_zone,
        dns_service_ip: pool.dns_service_ip,
        etcd_endpoints: pool.etcd_endpoints,
        vpc_id: pool.vpc_id,
        vpc_cidr: pool.vpc_cidr.unwrap_or(DEFAULT_VPC_CIDR),
        instance_cidr: pool.instance_cidr,
        security_group_ids: pool.security_group_ids,
        load_balancer: pool.load_balancer,
        target_group: pool.target_group,
        taints,
        spot_fleet,
        kube_reserved_resources: pool.kube_reserved_resources,
        system_reserved_resources: pool.system_reserved_resources,
    })
}

pub fn validate_taints(specs: &[TaintSpec]) -> Result<Vec<Taint>, Violation> {
    specs
        .iter()
        .enumerate()
        .map(|(i, spec)| {
            Taint::parse(&spec.key, &spec.value, &spec.effect).map_err(|e| {
                Violation::new(
                    Rule::TaintEffect,
                    format!("taints[{}].effect", i),
                    &spec.effect,
                    e.to_string(),
                )
            })
        })
        .collect()
}

/// The instance subnet must sit inside the VPC block once both the VPC and its block are given
pub fn validate_network(
    vpc_id: Option<&str>,
    vpc_cidr: Option<Ipv4Cidr>,
    instance_cidr: Ipv4Cidr,
) -> Result<(), Violation> {
    let (Some(_), Some(vpc_cidr)) = (vpc_id, vpc_cidr) else {
        return Ok(());
    };

    if vpc_cidr.contains(&instance_cidr) {
        Ok(())
    } else {
        Err(Violation::new(
            Rule::NetworkContainment,
            "instanceCIDR",
            instance_cidr,
            format!(
                "vpcCIDR ({}) does not contain instanceCIDR ({})",
                vpc_cidr, instance_cidr
            ),
        ))
    }
}

pub fn validate_security_groups(pool: &MergedNodePool) -> Result<(), Violation> {
    let distinct: BTreeSet<&str> = pool.user_security_group_ids().collect();

    if distinct.len() > MAX_USER_SECURITY_GROUPS {
        return Err(Violation::new(
            Rule::SecurityGroupQuota,
            "securityGroupIds",
            distinct.len(),
            format!(
                "number of user provided security groups must be less than or equal to {} but was {}",
                MAX_USER_SECURITY_GROUPS,
                distinct.len()
            ),
        ));
    }
    Ok(())
}

pub fn validate_spot_fleet(spec: &SpotFleetSpec) -> Result<SpotFleet, Violation> {
    if spec.target_capacity == 0 {
        return Err(Violation::new(
            Rule::SpotFleetCapacity,
            "spotFleet.targetCapacity",
            spec.target_capacity,
            "spot fleet target capacity must be greater than zero",
        ));
    }

    let launch_specifications = spec
        .launch_specifications
        .iter()
        .enumerate()
        .map(|(i, launch)| {
            let field = format!("spotFleet.launchSpecifications[{}]", i);

            if launch.instance_type.trim().is_empty() {
                return Err(Violation::new(
                    Rule::SpotFleetCapacity,
                    format!("{}.instanceType", field),
                    &launch.instance_type,
                    "launch specification must name an instance type",
                ));
            }
            if launch.weighted_capacity == 0 {
                return Err(Violation::new(
                    Rule::SpotFleetCapacity,
                    format!("{}.weightedCapacity", field),
                    launch.weighted_capacity,
                    "weighted capacity must be greater than zero",
                ));
            }

            let volume = &launch.root_volume;
            let volume_type = match volume.volume_type.as_deref() {
                Some(raw) => raw.parse::<VolumeType>().map_err(|e| {
                    Violation::new(
                        Rule::SpotFleetRootVolume,
                        format!("{}.rootVolume.type", field),
                        raw,
                        e.to_string(),
                    )
                })?,
                None => VolumeType::default(),
            };
            let root_volume = RootVolume::new(
                volume_type,
                volume.size.unwrap_or(DEFAULT_ROOT_VOLUME_SIZE),
                volume.iops,
            )
            .map_err(|e| {
                Violation::new(
                    Rule::SpotFleetRootVolume,
                    format!("{}.rootVolume.iops", field),
                    volume.iops.unwrap_or(0),
                    e.to_string(),
                )
            })?;

            Ok(LaunchSpecification {
                instance_type: launch.instance_type.trim().to_string(),
                weighted_capacity: launch.weighted_capacity,
                root_volume,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SpotFleet {
        target_capacity: spec.target_capacity,
        spot_price: spec.spot_price.clone(),
        launch_specifications,
    })
}

pub fn validate_reserved_resources(
    field: &str,
    resources: Option<&PodResources>,
) -> Result<(), Violation> {
    match resources {
        Some(resources) if !resources.is_valid() => Err(Violation::new(
            Rule::ReservedResources,
            field,
            format!("cpu={}, memory={}", resources.cpu, resources.memory),
            format!(
                "invalid {}: cpu must be in millicores such as \"100m\" and memory in Mi or Gi such as \"512Mi\"",
                field
            ),
        )),
        _ => Ok(()),
    }
}
