//! Show command implementation

use anyhow::{Context, Result};
use std::path::Path;

use super::validate::load_cluster;
use crate::config::NodePoolConfiguration;
use crate::config::settings::OutputFormat;
use crate::utils::read_config;

/// Render the effective configuration of a node pool after inheritance
pub fn render(cluster_config: &Path, node_pool: &Path, format: OutputFormat) -> Result<String> {
    let cluster = load_cluster(cluster_config)?;
    let bytes = read_config(node_pool)?;
    let config = NodePoolConfiguration::parse(&bytes, &cluster)
        .with_context(|| format!("Invalid node pool configuration: {}", node_pool.display()))?;

    match format {
        OutputFormat::Yaml => {
            serde_yaml::to_string(&config).context("Failed to serialize node pool as YAML")
        }
        OutputFormat::Json => {
            serde_json::to_string_pretty(&config).context("Failed to serialize node pool as JSON")
        }
    }
}

/// Handle show command
pub fn show(cluster_config: &Path, node_pool: &Path, format: OutputFormat) -> Result<()> {
    let rendered = render(cluster_config, node_pool, format)?;
    println!("{}", rendered.trim_end());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_files(dir: &Path) -> (std::path::PathBuf, std::path::PathBuf) {
        let cluster = dir.join("cluster.yaml");
        fs::write(
            &cluster,
            "region: eu-west-1\nkmsKeyArn: arn:aws:kms:eu-west-1:1:key/1\napiEndpoints:\n- name: default\n  dnsName: k8s.example.com\n",
        )
        .unwrap();
        let pool = dir.join("pool.yaml");
        fs::write(
            &pool,
            "clusterName: c\nnodePoolName: p\ndnsServiceIP: 10.3.0.10\netcdEndpoints: 10.0.0.1\ntaints:\n- key: k\n  value: v\n  effect: NoExecute\n",
        )
        .unwrap();
        (cluster, pool)
    }

    #[test]
    fn test_render_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let (cluster, pool) = write_files(dir.path());

        let yaml = render(&cluster, &pool, OutputFormat::Yaml).unwrap();
        assert!(yaml.contains("region: eu-west-1"));
        assert!(yaml.contains("effect: NoExecute"));
    }

    #[test]
    fn test_render_json() {
        let dir = tempfile::tempdir().unwrap();
        let (cluster, pool) = write_files(dir.path());

        let json = render(&cluster, &pool, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["kmsKeyArn"], "arn:aws:kms:eu-west-1:1:key/1");
        assert_eq!(value["instanceCIDR"], "10.0.1.0/24");
        assert_eq!(value["taints"][0]["effect"], "NoExecute");
    }
}
