//! Configuration errors rendered with actionable suggestions

use crate::config::error::{ConfigError, Rule};
use crate::model::spot_fleet::{MAX_IOPS, MIN_IOPS};
use colored::Colorize;
use std::path::Path;
use thiserror::Error;

/// Error with suggestions on how to fix the offending file
#[derive(Error, Debug)]
#[error("{message}")]
pub struct KubeAwsError {
    pub message: String,
    pub suggestions: Vec<String>,
    pub docs_link: Option<String>,
}

impl KubeAwsError {
    /// Create a new error with suggestions
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestions: Vec::new(),
            docs_link: None,
        }
    }

    /// Add a suggestion to the error
    pub fn suggest(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Add a documentation link
    pub fn with_docs(mut self, link: impl Into<String>) -> Self {
        self.docs_link = Some(link.into());
        self
    }

    /// Display the error with suggestions
    pub fn display(&self) {
        crate::log_error!("{}", self.message);
        eprint!("{}", self.details());
    }

    /// Suggestions and docs link; the message itself goes through the logger
    pub fn details(&self) -> String {
        let mut out = String::new();

        if !self.suggestions.is_empty() {
            out.push('\n');
            out.push_str(&format!("{}\n", "Suggestions:".yellow().bold()));
            for suggestion in &self.suggestions {
                out.push_str(&format!("  {} {}\n", "→".blue(), suggestion));
            }
        }

        if let Some(docs) = &self.docs_link {
            out.push('\n');
            out.push_str(&format!("{} {}\n", "Documentation:".cyan(), docs));
        }

        out
    }

    /// Describe a configuration error found in `path`
    pub fn from_config_error(path: &Path, err: &ConfigError) -> Self {
        let base = Self::new(format!("{}: {}", path.display(), err));

        match err {
            ConfigError::Parse { .. } => base
                .suggest("Check the indentation and quoting around the reported line")
                .suggest("Make sure the file is a single YAML document"),
            ConfigError::Schema { field: Some(field), .. } => base
                .suggest(format!("Fix or remove `{}`", field))
                .suggest("Run with -vv to see how the file was decoded"),
            ConfigError::Schema { field: None, .. } => base
                .suggest("A field has the wrong type, e.g. a string where a list is expected"),
            ConfigError::Inheritance { field, .. } => base
                .suggest(format!("Remove `{}` from the node pool configuration", field))
                .suggest(format!(
                    "`{}` is always inherited from the cluster's cluster.yaml",
                    field
                )),
            ConfigError::Semantic { violation, .. } => {
                base.suggest(rule_hint(violation.rule))
            }
        }
    }
}

fn rule_hint(rule: Rule) -> String {
    match rule {
        Rule::TaintEffect => {
            "Use one of NoSchedule, PreferNoSchedule or NoExecute as the taint effect".to_string()
        }
        Rule::NetworkContainment => {
            "Choose an instanceCIDR inside vpcCIDR, or omit vpcCIDR to use the default VPC block"
                .to_string()
        }
        Rule::SecurityGroupQuota => {
            "Merge security groups or drop some from securityGroupIds, loadBalancer and targetGroup"
                .to_string()
        }
        Rule::SpotFleetCapacity => {
            "Set a positive targetCapacity and a positive weightedCapacity per launch specification"
                .to_string()
        }
        Rule::SpotFleetRootVolume => format!(
            "Use standard, gp2 or io1 as rootVolume.type and only set iops ({}-{}) for io1",
            MIN_IOPS, MAX_IOPS
        ),
        Rule::ReservedResources => {
            "Use millicores for cpu (\"100m\") and Mi/Gi for memory (\"512Mi\")".to_string()
        }
    }
}

/// Helper to display error and exit
pub fn display_error_and_exit(error: KubeAwsError) -> ! {
    error.display();
    std::process::exit(1);
}

/// Convert anyhow error to KubeAwsError when possible
pub fn enhance_error(err: anyhow::Error) -> KubeAwsError {
    if let Some(config_error) = err.downcast_ref::<ConfigError>() {
        return KubeAwsError::new(format!("{:#}", err))
            .suggest(rule_or_kind_hint(config_error));
    }

    if let Some(io) = err.downcast_ref::<std::io::Error>()
        && io.kind() == std::io::ErrorKind::NotFound
    {
        return KubeAwsError::new(format!("{:#}", err))
            .suggest("Check the path, or set defaults.cluster_config in .kube-aws.toml");
    }

    KubeAwsError::new(format!("{:#}", err)).suggest("Run with --verbose for more details")
}

fn rule_or_kind_hint(err: &ConfigError) -> String {
    match err {
        ConfigError::Semantic { violation, .. } => rule_hint(violation.rule),
        ConfigError::Inheritance { field, .. } => {
            format!("Remove `{}` from the node pool configuration", field)
        }
        _ => "Fix the reported field and run validate again".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::error::{Document, Violation};
    use std::path::PathBuf;

    #[test]
    fn test_inheritance_suggestions() {
        let err = ConfigError::Inheritance {
            field: "kmsKeyArn",
            value: "arn".to_string(),
        };
        let enhanced = KubeAwsError::from_config_error(&PathBuf::from("node-pools/a/cluster.yaml"), &err);
        assert!(enhanced.message.starts_with("node-pools/a/cluster.yaml: "));
        assert_eq!(enhanced.suggestions.len(), 2);
        assert!(enhanced.suggestions[0].contains("kmsKeyArn"));
    }

    #[test]
    fn test_semantic_suggestion() {
        let violation = Violation::new(Rule::SecurityGroupQuota, "securityGroupIds", 5, "too many");
        let err = ConfigError::report("pool1", violation);
        let enhanced = KubeAwsError::from_config_error(Path::new("p.yaml"), &err);
        assert_eq!(enhanced.suggestions.len(), 1);
        assert!(enhanced.suggestions[0].contains("securityGroupIds"));
    }

    #[test]
    fn test_schema_suggestion_names_field() {
        let err = ConfigError::schema(Document::Cluster, "region", "must be set");
        let enhanced = KubeAwsError::from_config_error(Path::new("cluster.yaml"), &err);
        assert!(enhanced.suggestions[0].contains("`region`"));
    }

    #[test]
    fn test_enhance_error_downcasts_config_error() {
        let err = anyhow::Error::new(ConfigError::schema(Document::NodePool, "nodePoolName", "must be set"))
            .context("failed to validate node-pools/a/cluster.yaml");
        let enhanced = enhance_error(err);
        assert!(enhanced.message.contains("nodePoolName"));
        assert_eq!(enhanced.suggestions.len(), 1);
    }

    #[test]
    fn test_details_do_not_repeat_message() {
        colored::control::set_override(false);
        let err = KubeAwsError::new("cluster.yaml: region must be set")
            .suggest("Set region")
            .with_docs("https://example.com");
        let details = err.details();
        assert!(!details.contains("region must be set"));
        assert!(details.contains("→ Set region"));
        assert!(details.contains("Documentation: https://example.com"));

        assert_eq!(KubeAwsError::new("plain").details(), "");
    }

    #[test]
    fn test_error_with_docs() {
        let err = KubeAwsError::new("test error").with_docs("https://example.com");
        assert!(err.docs_link.is_some());
    }
}
