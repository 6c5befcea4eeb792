//! Errors produced while parsing, merging and validating configuration
//!
//! Every failure is reported as a single value. Validators produce a
//! [`Violation`] and the pipeline driver wraps the first one it sees into a
//! [`ConfigError::Semantic`] carrying the node pool it belongs to.

use std::fmt;
use thiserror::Error;

/// Which document an error originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Document {
    Cluster,
    NodePool,
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Document::Cluster => f.write_str("cluster"),
            Document::NodePool => f.write_str("node pool"),
        }
    }
}

/// The semantic rule a node pool broke
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    TaintEffect,
    NetworkContainment,
    SecurityGroupQuota,
    SpotFleetCapacity,
    SpotFleetRootVolume,
    ReservedResources,
}

impl Rule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rule::TaintEffect => "taint-effect",
            Rule::NetworkContainment => "network-containment",
            Rule::SecurityGroupQuota => "security-group-quota",
            Rule::SpotFleetCapacity => "spot-fleet-capacity",
            Rule::SpotFleetRootVolume => "spot-fleet-root-volume",
            Rule::ReservedResources => "reserved-resources",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single failed semantic check
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} (rule: {rule}, field: `{field}`, value: {value:?})")]
pub struct Violation {
    pub rule: Rule,
    /// Document path of the offending field, e.g. `taints[0].effect`
    pub field: String,
    pub value: String,
    pub message: String,
}

impl Violation {
    pub fn new(
        rule: Rule,
        field: impl Into<String>,
        value: impl ToString,
        message: impl Into<String>,
    ) -> Self {
        Self {
            rule,
            field: field.into(),
            value: value.to_string(),
            message: message.into(),
        }
    }
}

fn describe_field(field: Option<&str>, message: &str) -> String {
    match field {
        Some(field) => format!("`{}` {}", field, message),
        None => message.to_string(),
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    /// The document is not well-formed YAML
    #[error("failed to parse {document} configuration: {source}")]
    Parse {
        document: Document,
        #[source]
        source: serde_yaml::Error,
    },

    /// A field is missing, has the wrong type or a malformed value
    #[error("invalid {document} configuration: {}", describe_field(.field.as_deref(), .message))]
    Schema {
        document: Document,
        /// `None` when the decoder could not attribute the error to a field
        field: Option<String>,
        message: String,
    },

    /// A cross-field rule failed on the merged node pool
    #[error("invalid node pool \"{node_pool}\": {violation}")]
    Semantic {
        node_pool: String,
        #[source]
        violation: Violation,
    },

    /// The node pool tried to set a field it must inherit from the cluster
    #[error(
        "although you can't customize `{field}` per node pool but you did specify \"{value}\" in your node pool configuration"
    )]
    Inheritance { field: &'static str, value: String },
}

impl ConfigError {
    pub fn parse(document: Document, source: serde_yaml::Error) -> Self {
        Self::Parse { document, source }
    }

    pub fn schema(document: Document, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Schema {
            document,
            field: Some(field.into()),
            message: message.into(),
        }
    }

    /// Attach the node pool name to the first violation the pipeline reported
    pub fn report(node_pool: impl Into<String>, violation: Violation) -> Self {
        Self::Semantic {
            node_pool: node_pool.into(),
            violation,
        }
    }

    /// Name of the offending field, when the error is about one
    pub fn field(&self) -> Option<&str> {
        match self {
            ConfigError::Parse { .. } => None,
            ConfigError::Schema { field, .. } => field.as_deref(),
            ConfigError::Semantic { violation, .. } => Some(violation.field.as_str()),
            ConfigError::Inheritance { field, .. } => Some(*field),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semantic_error_keeps_validator_message() {
        let violation = Violation::new(
            Rule::TaintEffect,
            "taints[0].effect",
            "UnknownEffect",
            "invalid taint effect: UnknownEffect",
        );
        let err = ConfigError::report("pool1", violation);
        let msg = err.to_string();
        assert!(msg.contains("invalid node pool \"pool1\""));
        assert!(msg.contains("invalid taint effect: UnknownEffect"));
        assert!(msg.contains("rule: taint-effect"));
        assert_eq!(err.field(), Some("taints[0].effect"));
    }

    #[test]
    fn test_inheritance_message() {
        let err = ConfigError::Inheritance {
            field: "region",
            value: "ap-northeast-1".to_string(),
        };
        assert!(
            err.to_string()
                .contains("although you can't customize `region` per node pool but you did specify")
        );
    }

    #[test]
    fn test_schema_message() {
        let err = ConfigError::schema(Document::Cluster, "region", "must be set");
        assert_eq!(
            err.to_string(),
            "invalid cluster configuration: `region` must be set"
        );
    }
}
