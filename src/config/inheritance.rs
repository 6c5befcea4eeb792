//! Which node pool fields may diverge from the cluster they belong to
//!
//! Every field declared at both scopes has a descriptor in [`INHERITED_FIELDS`].
//! The merger resolves each of them the same way: an overridable field takes
//! the node pool's value when present and the cluster's otherwise, while an
//! immutable field is rejected as soon as the node pool declares it at all.

use super::cluster::ClusterConfiguration;
use super::error::ConfigError;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// The node pool may set its own value, absence means "use the cluster's"
    Overridable,
    /// The node pool must not declare the field, even with the cluster's value
    Immutable,
}

/// Descriptor of one field declared at both cluster and node pool scope
#[derive(Clone, Copy)]
pub struct InheritedField {
    pub name: &'static str,
    pub policy: Policy,
    cluster: fn(&ClusterConfiguration) -> Option<String>,
    node_pool: for<'a> fn(&Declared<'a>) -> Option<&'a str>,
    apply: fn(&mut Inherited, Option<String>),
}

pub const REGION: InheritedField = InheritedField {
    name: "region",
    policy: Policy::Immutable,
    cluster: |c| Some(c.region.clone()),
    node_pool: |d| d.region,
    apply: |i, v| i.region = v.unwrap_or_default(),
};

pub const KMS_KEY_ARN: InheritedField = InheritedField {
    name: "kmsKeyArn",
    policy: Policy::Immutable,
    cluster: |c| c.kms_key_arn.clone(),
    node_pool: |d| d.kms_key_arn,
    apply: |i, v| i.kms_key_arn = v,
};

pub const AVAILABILITY_ZONE: InheritedField = InheritedField {
    name: "availabilityZone",
    policy: Policy::Overridable,
    cluster: |c| c.availability_zone.clone(),
    node_pool: |d| d.availability_zone,
    apply: |i, v| i.availability_zone = v,
};

pub const VPC_ID: InheritedField = InheritedField {
    name: "vpcId",
    policy: Policy::Overridable,
    cluster: |c| c.vpc_id.clone(),
    node_pool: |d| d.vpc_id,
    apply: |i, v| i.vpc_id = v,
};

pub const VPC_CIDR: InheritedField = InheritedField {
    name: "vpcCIDR",
    policy: Policy::Overridable,
    cluster: |c| c.vpc_cidr.map(|cidr| cidr.to_string()),
    node_pool: |d| d.vpc_cidr,
    apply: |i, v| i.vpc_cidr = v,
};

/// Immutable fields come first so they are rejected before anything else is trusted
pub const INHERITED_FIELDS: [InheritedField; 5] =
    [REGION, KMS_KEY_ARN, AVAILABILITY_ZONE, VPC_ID, VPC_CIDR];

impl InheritedField {
    pub fn is_overridable(&self) -> bool {
        self.policy == Policy::Overridable
    }

    /// Resolve the effective value from the cluster's and the node pool's declarations
    ///
    /// Blank node pool values count as undeclared.
    pub fn resolve(
        &self,
        cluster: Option<&str>,
        node_pool: Option<&str>,
    ) -> Result<Option<String>, ConfigError> {
        let declared = node_pool.map(str::trim).filter(|v| !v.is_empty());

        match (self.policy, declared) {
            (Policy::Immutable, Some(value)) => Err(ConfigError::Inheritance {
                field: self.name,
                value: value.to_string(),
            }),
            (Policy::Overridable, Some(value)) => Ok(Some(value.to_string())),
            (_, None) => Ok(cluster.map(str::to_string)),
        }
    }
}

impl fmt::Debug for InheritedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InheritedField")
            .field("name", &self.name)
            .field("policy", &self.policy)
            .finish()
    }
}

impl fmt::Display for InheritedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// The node pool's own declarations of the inherited fields
#[derive(Debug, Clone, Copy, Default)]
pub struct Declared<'a> {
    pub region: Option<&'a str>,
    pub kms_key_arn: Option<&'a str>,
    pub availability_zone: Option<&'a str>,
    pub vpc_id: Option<&'a str>,
    pub vpc_cidr: Option<&'a str>,
}

/// Effective values of the inherited fields for one node pool
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inherited {
    pub region: String,
    pub kms_key_arn: Option<String>,
    pub availability_zone: Option<String>,
    pub vpc_id: Option<String>,
    /// Unparsed; `None` when neither scope declared a VPC block
    pub vpc_cidr: Option<String>,
}

/// Resolve every inherited field, aborting on the first immutable override
pub fn merge(parent: &ClusterConfiguration, declared: Declared<'_>) -> Result<Inherited, ConfigError> {
    let mut inherited = Inherited::default();

    for field in INHERITED_FIELDS {
        let from_cluster = (field.cluster)(parent);
        let value = field.resolve(from_cluster.as_deref(), (field.node_pool)(&declared))?;
        tracing::trace!(field = %field, value = ?value, "resolved inherited field");
        (field.apply)(&mut inherited, value);
    }

    Ok(inherited)
}
